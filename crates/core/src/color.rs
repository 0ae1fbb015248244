//! RGBA color type for the plexus drawing surface.
//!
//! Every drawn primitive carries an [`Rgba`]: the particle fill, the
//! distance-faded connection lines, and the background clear. Components
//! are `f64` in [0, 1]; the hex round-trip has 8-bit quantization
//! (1/255 precision loss), which is acceptable since hex colors are
//! inherently 8-bit.

use crate::error::EffectError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// RGBA color with components in [0, 1].
///
/// Serializes as a hex string: `"#rrggbb"` when fully opaque,
/// `"#rrggbbaa"` otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    /// Parses a hex color like `"#e87c03"`, `"e87c03"`, or `"#e87c0380"`
    /// (case insensitive; 6 digits imply full opacity).
    ///
    /// Returns `EffectError::InvalidColor` for any other shape.
    pub fn from_hex(hex: &str) -> Result<Rgba, EffectError> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 && hex.len() != 8 {
            return Err(EffectError::InvalidColor(format!(
                "expected 6 or 8 hex digits, got {}",
                hex.len()
            )));
        }
        let component = |range: std::ops::Range<usize>, name: &str| {
            u8::from_str_radix(&hex[range], 16)
                .map(|v| v as f64 / 255.0)
                .map_err(|e| EffectError::InvalidColor(format!("invalid {name} component: {e}")))
        };
        Ok(Rgba {
            r: component(0..2, "red")?,
            g: component(2..4, "green")?,
            b: component(4..6, "blue")?,
            a: if hex.len() == 8 {
                component(6..8, "alpha")?
            } else {
                1.0
            },
        })
    }

    /// Converts the color to a hex string, quantizing components to 8 bit.
    ///
    /// Emits `"#rrggbb"` when the alpha quantizes to 255, `"#rrggbbaa"`
    /// otherwise, so fully opaque colors round-trip to the short form.
    pub fn to_hex(self) -> String {
        let q = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (q(self.r), q(self.g), q(self.b), q(self.a));
        if a == 255 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }

    /// Returns a copy with the alpha replaced, clamped to [0, 1].
    ///
    /// This is how the fade rules produce their per-line opacity from the
    /// shared base color.
    pub fn with_alpha(self, alpha: f64) -> Rgba {
        Rgba {
            a: alpha.clamp(0.0, 1.0),
            ..self
        }
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgba::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
