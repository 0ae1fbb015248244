//! Reproducible specification for a rendered frame.
//!
//! A [`Recipe`] captures everything needed to recreate a render:
//! preset name, surface dimensions, parameter overrides, PRNG seed,
//! frame count, and optional pointer position. Two identical `Recipe`
//! values fed to the same binary produce bit-identical output.

use crate::error::EffectError;
use serde::{Deserialize, Serialize};

/// Reproducible specification for a rendered frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipe {
    pub preset: String,
    pub width: usize,
    pub height: usize,
    #[serde(default = "empty_params")]
    pub params: serde_json::Value,
    pub seed: u64,
    pub frames: u64,
    /// Pointer position held for the whole run, `[x, y]` in surface pixels.
    #[serde(default)]
    pub pointer: Option<[f64; 2]>,
}

fn empty_params() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl Recipe {
    /// Creates a new Recipe with default params (`{}`), zero frames, and no pointer.
    pub fn new(preset: &str, width: usize, height: usize, seed: u64) -> Self {
        Self {
            preset: preset.to_string(),
            width,
            height,
            params: empty_params(),
            seed,
            frames: 0,
            pointer: None,
        }
    }

    /// Validates that the recipe has non-zero dimensions and that
    /// `width * height` does not overflow.
    pub fn validate(&self) -> Result<(), EffectError> {
        if self.width == 0 || self.height == 0 {
            return Err(EffectError::InvalidDimensions);
        }
        self.width
            .checked_mul(self.height)
            .ok_or(EffectError::InvalidDimensions)?;
        Ok(())
    }
}
