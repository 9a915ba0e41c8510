use flicker_image::{ImageError, Raster};

use crate::parallel;

/// A point-to-point mapping used by the reverse warp.
///
/// Implementors map a destination coordinate to the source coordinate it is read from.
pub trait PointMap: Sync {
    /// Map `(x, y)` to its corresponding point.
    fn map_point(&self, x: f64, y: f64) -> (f64, f64);
}

/// Round a mapped coordinate to the nearest pixel inside `[0, len - 1]`.
#[inline]
pub(crate) fn clamp_coord(v: f64, len: usize) -> usize {
    if v.is_nan() || v <= 0.0 {
        return 0;
    }
    let max = len.saturating_sub(1);
    (v.round() as usize).min(max)
}

/// Warp a raster by reverse mapping.
///
/// Every destination pixel `(x, y)` is filled from the source pixel nearest to
/// `map.map_point(x, y)`, clamped to the source bounds, so the output has no holes.
///
/// # Arguments
///
/// * `src` - The source raster.
/// * `dst` - The destination raster with the same size as `src`.
/// * `map` - Destination to source coordinate mapping.
///
/// # Example
///
/// ```
/// use flicker_image::Raster;
/// use flicker_imgproc::warp::{warp_reverse, PointMap};
///
/// struct ShiftLeft;
/// impl PointMap for ShiftLeft {
///     fn map_point(&self, x: f64, y: f64) -> (f64, f64) {
///         (x + 1.0, y)
///     }
/// }
///
/// let src = Raster::new([3, 1].into(), vec![1, 2, 3]).unwrap();
/// let mut dst = Raster::from_size_val(src.size(), 0).unwrap();
/// warp_reverse(&src, &mut dst, &ShiftLeft).unwrap();
/// assert_eq!(dst.as_slice(), &[2, 3, 3]);
/// ```
pub fn warp_reverse<M: PointMap + ?Sized>(
    src: &Raster,
    dst: &mut Raster,
    map: &M,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    let (cols, rows) = (src.cols(), src.rows());
    let data = src.as_slice();

    parallel::par_iter_dst_rows(dst, |y, dst_row| {
        for (x, out) in dst_row.iter_mut().enumerate() {
            let (sx, sy) = map.map_point(x as f64, y as f64);
            let (sx, sy) = (clamp_coord(sx, cols), clamp_coord(sy, rows));
            *out = data[sy * cols + sx];
        }
    });

    Ok(())
}
