//! Guard region: a constant border kept around a raster so that zoom and filter
//! operations near the edges never sample outside the buffer.

use flicker_image::{ImageError, ImageSize, Raster, WHITE};
use serde::{Deserialize, Serialize};

use crate::crop::{crop_image, paste_image};
use crate::resize::{resample, ResampleMode};

/// Width and fill value of a guard border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardRegion {
    /// Border width in pixels on each side.
    pub margin: usize,
    /// Packed pixel value of the border.
    pub fill: u32,
}

impl Default for GuardRegion {
    fn default() -> Self {
        Self {
            margin: 8,
            fill: WHITE,
        }
    }
}

impl GuardRegion {
    /// Size of a raster with this guard added around `interior`.
    pub fn padded_size(&self, interior: ImageSize) -> ImageSize {
        ImageSize {
            width: interior.width + 2 * self.margin,
            height: interior.height + 2 * self.margin,
        }
    }

    /// Size of the interior of a guarded raster of size `padded`, if it has one.
    pub fn interior_size(&self, padded: ImageSize) -> Option<ImageSize> {
        let width = padded.width.checked_sub(2 * self.margin)?;
        let height = padded.height.checked_sub(2 * self.margin)?;
        Some(ImageSize { width, height })
    }

    /// The same guard with its margin scaled by `scale`.
    pub fn scaled(&self, scale: f64) -> Self {
        Self {
            margin: (self.margin as f64 * scale).round().max(0.0) as usize,
            fill: self.fill,
        }
    }
}

/// Surround `src` with the guard border.
///
/// # Example
///
/// ```
/// use flicker_image::Raster;
/// use flicker_imgproc::guard::{add_guard, GuardRegion};
///
/// let src = Raster::from_size_val([2, 2].into(), 7).unwrap();
/// let guarded = add_guard(&src, &GuardRegion { margin: 1, fill: 0 }).unwrap();
/// assert_eq!((guarded.width(), guarded.height()), (4, 4));
/// assert_eq!(guarded.get_pixel(1, 1, 0).unwrap(), 7);
/// assert_eq!(guarded.get_pixel(0, 0, 0).unwrap(), 0);
/// ```
pub fn add_guard(src: &Raster, guard: &GuardRegion) -> Result<Raster, ImageError> {
    let mut dst = Raster::try_from_size_val(guard.padded_size(src.size()), guard.fill)?;
    paste_image(src, &mut dst, guard.margin, guard.margin)?;
    Ok(dst)
}

/// Remove the guard border from `src`, returning the interior.
///
/// # Errors
///
/// Returns [`ImageError::EmptyImage`] if `src` is not larger than twice the margin.
pub fn strip_guard(src: &Raster, guard: &GuardRegion) -> Result<Raster, ImageError> {
    let interior = guard
        .interior_size(src.size())
        .filter(|s| s.area() > 0)
        .ok_or(ImageError::EmptyImage(src.cols(), src.rows()))?;

    let mut dst = Raster::try_from_size_val(interior, 0)?;
    crop_image(src, &mut dst, guard.margin, guard.margin)?;
    Ok(dst)
}

/// Zoom a guarded raster.
///
/// Only the interior is resampled, to `interior_size`; the border is rebuilt
/// with its margin scaled by the same horizontal factor, so the fill never
/// bleeds into the image.
///
/// Returns the new guarded raster and the rescaled guard.
pub fn resample_with_guard(
    src: &Raster,
    guard: &GuardRegion,
    interior_size: ImageSize,
    mode: ResampleMode,
) -> Result<(Raster, GuardRegion), ImageError> {
    let interior = strip_guard(src, guard)?;

    let mut zoomed = Raster::try_from_size_val(interior_size, 0)?;
    resample(&interior, &mut zoomed, mode)?;

    let scale = interior_size.width as f64 / interior.width() as f64;
    let new_guard = guard.scaled(scale);
    Ok((add_guard(&zoomed, &new_guard)?, new_guard))
}
