use fast_image_resize as fr;
use flicker_image::{ImageError, ImageSize, Raster};
use serde::{Deserialize, Serialize};

/// Scaling algorithm used by [`resample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResampleMode {
    /// Nearest neighbor.
    #[default]
    Nearest,
    /// Box filter averaging over the covered source area.
    Area,
}

/// Bounds applied to a requested zoom magnification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomPolicy {
    /// Smallest allowed magnification.
    pub min: f64,
    /// Largest allowed magnification.
    pub max: f64,
}

impl Default for ZoomPolicy {
    fn default() -> Self {
        Self {
            min: 0.125,
            max: 8.0,
        }
    }
}

impl ZoomPolicy {
    /// Clamp a magnification into `[min, max]`. Non-finite values map to 1.
    pub fn clamp(&self, mag: f64) -> f64 {
        if !mag.is_finite() {
            return 1.0;
        }
        mag.clamp(self.min, self.max)
    }
}

/// Aspect-locked target size for a zoom by `mag`, after applying `policy`.
///
/// Both sides are scaled by the same clamped factor and rounded, never below one pixel.
///
/// # Example
///
/// ```
/// use flicker_imgproc::resize::{zoom_size, ZoomPolicy};
///
/// let size = zoom_size([100, 50].into(), 0.5, &ZoomPolicy::default());
/// assert_eq!((size.width, size.height), (50, 25));
///
/// let size = zoom_size([100, 50].into(), 100.0, &ZoomPolicy::default());
/// assert_eq!((size.width, size.height), (800, 400));
/// ```
pub fn zoom_size(size: ImageSize, mag: f64, policy: &ZoomPolicy) -> ImageSize {
    let mag = policy.clamp(mag);
    let scale = |v: usize| ((v as f64 * mag).round() as usize).max(1);
    ImageSize {
        width: scale(size.width),
        height: scale(size.height),
    }
}

fn to_bytes(raster: &Raster) -> Vec<u8> {
    raster
        .as_slice()
        .iter()
        .flat_map(|p| p.to_le_bytes())
        .collect()
}

/// Resample a packed raster into `dst`, whose size is the target size.
///
/// The four bytes of each pixel are scaled as independent channels with the
/// [fast_image_resize](https://crates.io/crates/fast_image_resize) crate.
///
/// # Arguments
///
/// * `src` - The source raster.
/// * `dst` - The destination raster, already allocated at the new size.
/// * `mode` - The scaling algorithm.
///
/// # Errors
///
/// Returns [`ImageError::EmptyImage`] if either raster has no pixels, or
/// [`ImageError::ResampleError`] if the resizer rejects the buffers.
///
/// # Example
///
/// ```
/// use flicker_image::Raster;
/// use flicker_imgproc::resize::{resample, ResampleMode};
///
/// let src = Raster::from_size_val([4, 4].into(), 0xFF10_2030).unwrap();
/// let mut dst = Raster::from_size_val([2, 2].into(), 0).unwrap();
/// resample(&src, &mut dst, ResampleMode::Area).unwrap();
/// assert!(dst.as_slice().iter().all(|&p| p == 0xFF10_2030));
/// ```
pub fn resample(src: &Raster, dst: &mut Raster, mode: ResampleMode) -> Result<(), ImageError> {
    if src.size().area() == 0 {
        return Err(ImageError::EmptyImage(src.cols(), src.rows()));
    }
    if dst.size().area() == 0 {
        return Err(ImageError::EmptyImage(dst.cols(), dst.rows()));
    }

    if src.size() == dst.size() {
        dst.as_slice_mut().copy_from_slice(src.as_slice());
        return Ok(());
    }

    let src_bytes = to_bytes(src);
    let src_image = fr::images::ImageRef::new(
        src.width() as u32,
        src.height() as u32,
        &src_bytes,
        fr::PixelType::U8x4,
    )
    .map_err(|e| ImageError::ResampleError(e.to_string()))?;

    let mut dst_bytes = vec![0u8; dst.size().area() * 4];
    let mut dst_image = fr::images::Image::from_slice_u8(
        dst.width() as u32,
        dst.height() as u32,
        &mut dst_bytes,
        fr::PixelType::U8x4,
    )
    .map_err(|e| ImageError::ResampleError(e.to_string()))?;

    let alg = match mode {
        ResampleMode::Nearest => fr::ResizeAlg::Nearest,
        ResampleMode::Area => fr::ResizeAlg::Convolution(fr::FilterType::Box),
    };
    // alpha is an ordinary channel here, no premultiplication
    let options = fr::ResizeOptions::new().resize_alg(alg).use_alpha(false);

    fr::Resizer::new()
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|e| ImageError::ResampleError(e.to_string()))?;

    dst.as_slice_mut()
        .iter_mut()
        .zip(dst_bytes.chunks_exact(4))
        .for_each(|(p, b)| *p = u32::from_le_bytes([b[0], b[1], b[2], b[3]]));

    Ok(())
}
