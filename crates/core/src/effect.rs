//! The core `Effect` trait every plexus animation implements.
//!
//! An effect is a step-based simulation that redraws itself in full each
//! frame and reacts to two external inputs: pointer position and surface
//! resize. All of its state — particle batch, pointer, dimensions — lives
//! behind this trait; there are no ambient globals.

use crate::error::EffectError;
use crate::surface::Surface;
use glam::DVec2;
use serde_json::Value;

/// Core trait for per-frame background effects.
///
/// Each frame the [`Driver`](crate::Driver) calls `step()` then
/// `render()`. Pointer and resize events arrive between frames through
/// `set_pointer` and `resize`.
///
/// This trait is **object-safe**: you can use `Box<dyn Effect>` or
/// `&mut dyn Effect` for runtime polymorphism.
pub trait Effect {
    /// Advance the simulation by one frame.
    fn step(&mut self) -> Result<(), EffectError>;

    /// Clear the surface and redraw the current state in full.
    fn render(&self, surface: &mut dyn Surface);

    /// Update pointer state: `Some` on pointer-move, `None` on pointer-leave.
    fn set_pointer(&mut self, pointer: Option<DVec2>);

    /// React to a surface resize.
    ///
    /// Returns `EffectError::InvalidDimensions` if either dimension is
    /// zero, negative, or non-finite.
    fn resize(&mut self, width: f64, height: f64) -> Result<(), EffectError>;

    /// Current parameter values as a JSON object.
    fn params(&self) -> Value;

    /// Schema describing all available parameters, their types, ranges, and defaults.
    fn param_schema(&self) -> Value;
}
