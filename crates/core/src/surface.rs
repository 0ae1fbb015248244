//! The 2D immediate-mode drawing surface an effect renders to.
//!
//! The trait covers exactly the primitives the particle field needs:
//! clear, filled circle, stroked line. Implementations decide what a
//! "pixel" is — the render crate rasterizes into an RGBA8 buffer, and
//! tests substitute recording doubles.

use crate::color::Rgba;
use glam::DVec2;

/// An immediate-mode drawing surface.
///
/// Coordinates are in surface pixels with the origin at the top-left.
/// Geometry partially or fully outside the surface must be clipped, not
/// rejected. This trait is **object-safe**: effects draw through
/// `&mut dyn Surface`.
pub trait Surface {
    /// Fills the entire surface with `color`, discarding prior content.
    fn clear(&mut self, color: Rgba);

    /// Draws a filled circle centered at `center`.
    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Rgba);

    /// Draws a stroked line segment from `a` to `b` with the given width.
    fn stroke_line(&mut self, a: DVec2, b: DVec2, width: f64, color: Rgba);
}
