#![deny(unsafe_code)]
//! Preset registry and CPU-side rasterization for plexus.
//!
//! This crate sits between `plexus-core` (which defines the `Effect` and
//! `Surface` traits) and `plexus-field`. Name-based preset construction
//! lives here so the CLI does not duplicate dispatch logic, alongside
//! the [`raster::PixelSurface`] rasterizer and the PNG snapshot path.

pub mod raster;

#[cfg(feature = "png")]
pub mod snapshot;

use plexus_core::error::EffectError;
use plexus_field::{FieldParams, ParticleField};
use serde_json::Value;

/// All available preset names.
const PRESET_NAMES: &[&str] = &["drift", "pulse"];

/// Returns a slice of all recognized preset names.
pub fn list_presets() -> &'static [&'static str] {
    PRESET_NAMES
}

/// Looks up a preset's tuning by name.
///
/// Returns `EffectError::UnknownPreset` if the name is not recognized.
pub fn preset_params(name: &str) -> Result<FieldParams, EffectError> {
    match name {
        "drift" => Ok(FieldParams::drift()),
        "pulse" => Ok(FieldParams::pulse()),
        _ => Err(EffectError::UnknownPreset(name.to_string())),
    }
}

/// Constructs a particle field by preset name, applying JSON overrides.
///
/// Both presets build the same `ParticleField` type — they differ only in
/// tuning — so this returns it directly rather than through a dispatch
/// wrapper.
pub fn from_name(
    name: &str,
    width: f64,
    height: f64,
    seed: u64,
    overrides: &Value,
) -> Result<ParticleField, EffectError> {
    let params = preset_params(name)?.with_overrides(overrides)?;
    ParticleField::new(width, height, seed, params)
}
