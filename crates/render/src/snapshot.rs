//! PNG snapshot of a rendered [`PixelSurface`].
//!
//! Feature-gated behind `png` (default on) so embedders that only need
//! the rasterizer can depend on this crate without pulling in `image`.

use plexus_core::error::EffectError;
use std::path::Path;

use crate::raster::PixelSurface;

/// Writes the surface's current pixels as a PNG image.
///
/// Returns `EffectError::InvalidDimensions` if the surface dimensions
/// overflow `u32`, or `EffectError::Io` on write failure.
pub fn write_png(surface: &PixelSurface, path: &Path) -> Result<(), EffectError> {
    let w = u32::try_from(surface.width()).map_err(|_| EffectError::InvalidDimensions)?;
    let h = u32::try_from(surface.height()).map_err(|_| EffectError::InvalidDimensions)?;
    let img = image::RgbaImage::from_raw(w, h, surface.data().to_vec())
        .ok_or_else(|| EffectError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path).map_err(|e| EffectError::Io(e.to_string()))
}
