//! Error types for the plexus core.

use thiserror::Error;

/// Errors produced by effect and rendering operations.
#[derive(Debug, Error)]
pub enum EffectError {
    /// Width or height was zero, negative, or non-finite.
    #[error("invalid dimensions: width and height must be positive and finite")]
    InvalidDimensions,

    /// A parameter value was rejected during validation.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// A requested preset name was not recognized.
    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// An I/O failure (snapshot write, recipe read).
    #[error("i/o error: {0}")]
    Io(String),
}
