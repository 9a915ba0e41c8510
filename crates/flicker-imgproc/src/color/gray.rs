use flicker_image::{packed, GrayImage, ImageError, Raster};
use serde::{Deserialize, Serialize};

use crate::parallel;

/// Weights used to collapse a packed RGB raster to gray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GrayWeights {
    /// `0.33 R + 0.50 R + 0.17 R`: all three weights read the red channel, as the
    /// legacy conversion did. Output equals the red channel.
    #[default]
    SourceLiteral,
    /// `0.299 R + 0.587 G + 0.114 B`.
    Ntsc,
}

impl GrayWeights {
    /// Gray value of one RGB triple.
    pub fn apply(&self, r: u8, g: u8, b: u8) -> u8 {
        let (r, g, b) = (r as f64, g as f64, b as f64);
        let y = match self {
            GrayWeights::SourceLiteral => 0.33 * r + 0.50 * r + 0.17 * r,
            GrayWeights::Ntsc => 0.299 * r + 0.587 * g + 0.114 * b,
        };
        y.round().min(255.0) as u8
    }
}

/// Convert a packed RGB raster to a gray image.
///
/// Precondition: the input and output images must have the same size.
///
/// # Example
///
/// ```
/// use flicker_image::{packed::pack_rgb, GrayImage, Raster};
/// use flicker_imgproc::color::{gray_from_rgb_packed, GrayWeights};
///
/// let src = Raster::new([1, 1].into(), vec![pack_rgb(255, 255, 255)]).unwrap();
/// let mut gray = GrayImage::from_size_val(src.size(), 0).unwrap();
/// gray_from_rgb_packed(&src, &mut gray, GrayWeights::Ntsc).unwrap();
/// assert_eq!(gray.as_slice(), &[255]);
/// ```
pub fn gray_from_rgb_packed(
    src: &Raster,
    dst: &mut GrayImage,
    weights: GrayWeights,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    parallel::par_iter_rows_val(src, dst, |&p, out| {
        let (r, g, b) = packed::unpack_rgb(p);
        *out = weights.apply(r, g, b);
    });

    Ok(())
}
