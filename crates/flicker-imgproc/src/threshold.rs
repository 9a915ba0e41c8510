use flicker_image::{GrayImage, ImageError};
use serde::{Deserialize, Serialize};

use crate::parallel;

/// Which side of the slice range is cleared to white.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SliceMode {
    /// Pixels whose key lies outside `[t1, t2]` become white; the rest pass through.
    #[default]
    Outside,
    /// Pixels whose key lies inside `[t1, t2]` become white; the rest pass through.
    Inside,
}

/// Slice an image by gray range.
///
/// The key compared against `[t1, t2]` is the complement `255 - g` when the data
/// is black-is-zero, so that dense (dark) regions have high keys; otherwise it is
/// the gray value itself. Pixels on the cleared side of the range become 255,
/// the others are copied unchanged.
///
/// # Arguments
///
/// * `src` - The input gray image.
/// * `dst` - The output gray image.
/// * `t1` - Lower bound of the range, inclusive.
/// * `t2` - Upper bound of the range, inclusive.
/// * `mode` - Which side of the range is cleared.
/// * `black_is_zero` - Polarity of the source data.
///
/// # Example
///
/// ```
/// use flicker_image::GrayImage;
/// use flicker_imgproc::threshold::{threshold_slice, SliceMode};
///
/// let src = GrayImage::new([3, 1].into(), vec![10, 128, 250]).unwrap();
/// let mut dst = GrayImage::from_size_val(src.size(), 0).unwrap();
///
/// // keys are 245, 127, 5: only the middle one lies in [100, 200]
/// threshold_slice(&src, &mut dst, 100, 200, SliceMode::Outside, true).unwrap();
/// assert_eq!(dst.as_slice(), &[255, 128, 255]);
/// ```
pub fn threshold_slice(
    src: &GrayImage,
    dst: &mut GrayImage,
    t1: u8,
    t2: u8,
    mode: SliceMode,
    black_is_zero: bool,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    parallel::par_iter_rows_val(src, dst, |&g, out| {
        let key = if black_is_zero { 255 - g } else { g };
        let inside = key >= t1 && key <= t2;
        let cleared = match mode {
            SliceMode::Outside => !inside,
            SliceMode::Inside => inside,
        };
        *out = if cleared { 255 } else { g };
    });

    Ok(())
}
