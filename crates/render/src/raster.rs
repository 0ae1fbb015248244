//! CPU rasterizer implementing [`Surface`] over an RGBA8 buffer.
//!
//! Circles and lines are rendered by per-pixel coverage against the
//! shape's signed distance, giving roughly one pixel of soft edge, and
//! composited source-over. Geometry outside the buffer is clipped, never
//! an error — the effect deliberately lets particles overshoot the edges.

use glam::DVec2;
use plexus_core::color::Rgba;
use plexus_core::error::EffectError;
use plexus_core::surface::Surface;

/// An RGBA8 pixel buffer that implements [`Surface`].
#[derive(Debug, Clone)]
pub struct PixelSurface {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl PixelSurface {
    /// Creates a fully transparent surface.
    ///
    /// Returns `EffectError::InvalidDimensions` if either dimension is
    /// zero or the buffer size would overflow `usize`.
    pub fn new(width: usize, height: usize) -> Result<Self, EffectError> {
        if width == 0 || height == 0 {
            return Err(EffectError::InvalidDimensions);
        }
        let len = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(4))
            .ok_or(EffectError::InvalidDimensions)?;
        Ok(Self {
            width,
            height,
            data: vec![0; len],
        })
    }

    /// Surface width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Surface height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Read-only access to the RGBA8 buffer (row-major, 4 bytes per pixel).
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The RGBA bytes of one pixel.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the surface.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        let idx = (y * self.width + x) * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    /// Composites `color` over the pixel at `(x, y)` with the given
    /// coverage; coordinates outside the surface are ignored.
    fn blend(&mut self, x: isize, y: isize, color: Rgba, coverage: f64) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let alpha = (color.a * coverage).clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 4;
        let dst_a = self.data[idx + 3] as f64 / 255.0;
        let out_a = alpha + dst_a * (1.0 - alpha);

        let src = [color.r, color.g, color.b];
        for (offset, &s) in src.iter().enumerate() {
            let d = self.data[idx + offset] as f64 / 255.0;
            let out = (s * alpha + d * dst_a * (1.0 - alpha)) / out_a;
            self.data[idx + offset] = (out.clamp(0.0, 1.0) * 255.0).round() as u8;
        }
        self.data[idx + 3] = (out_a.clamp(0.0, 1.0) * 255.0).round() as u8;
    }

    /// Pixel range [lo, hi) covering `min..max` padded by `pad`, clipped
    /// to one axis of the surface.
    fn clipped_span(min: f64, max: f64, pad: f64, limit: usize) -> (isize, isize) {
        let lo = (min - pad).floor().max(0.0) as isize;
        let hi = (((max + pad).ceil() + 1.0) as isize).min(limit as isize);
        (lo, hi)
    }
}

impl Surface for PixelSurface {
    fn clear(&mut self, color: Rgba) {
        let q = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        let pixel = [q(color.r), q(color.g), q(color.b), q(color.a)];
        for chunk in self.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&pixel);
        }
    }

    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Rgba) {
        if !center.is_finite() || !radius.is_finite() || radius <= 0.0 {
            return;
        }
        let (x0, x1) = Self::clipped_span(center.x - radius, center.x + radius, 1.0, self.width);
        let (y0, y1) = Self::clipped_span(center.y - radius, center.y + radius, 1.0, self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                let sample = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
                let coverage = (radius + 0.5 - sample.distance(center)).clamp(0.0, 1.0);
                self.blend(x, y, color, coverage);
            }
        }
    }

    fn stroke_line(&mut self, a: DVec2, b: DVec2, width: f64, color: Rgba) {
        if !a.is_finite() || !b.is_finite() || !width.is_finite() || width <= 0.0 {
            return;
        }
        let half = width / 2.0;
        let pad = half + 1.0;
        let (x0, x1) = Self::clipped_span(a.x.min(b.x), a.x.max(b.x), pad, self.width);
        let (y0, y1) = Self::clipped_span(a.y.min(b.y), a.y.max(b.y), pad, self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                let sample = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
                let coverage = (half + 0.5 - distance_to_segment(sample, a, b)).clamp(0.0, 1.0);
                self.blend(x, y, color, coverage);
            }
        }
    }
}

/// Distance from `p` to the segment `a`–`b`; a zero-length segment
/// degenerates to the distance to `a` (drawn as a round dot).
fn distance_to_segment(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}
