use flicker_image::{GrayImage, ImageError};

use crate::histogram::{GrayHistogram, GRAY_BINS};
use crate::parallel;

/// A 256-entry gray lookup table.
pub type GrayLut = [u8; GRAY_BINS];

fn check_sizes(src: &GrayImage, dst: &GrayImage) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }
    Ok(())
}

/// Map every pixel of `src` through a lookup table into `dst`.
///
/// PRECONDITION: `src` and `dst` must have the same size.
pub fn apply_lut(src: &GrayImage, dst: &mut GrayImage, lut: &GrayLut) -> Result<(), ImageError> {
    check_sizes(src, dst)?;
    parallel::par_iter_rows_val(src, dst, |&s, d| *d = lut[s as usize]);
    Ok(())
}

/// Invert the gray values, `255 - g`.
///
/// # Example
///
/// ```
/// use flicker_image::GrayImage;
/// use flicker_imgproc::enhance::complement;
///
/// let src = GrayImage::new([3, 1].into(), vec![0, 100, 255]).unwrap();
/// let mut dst = GrayImage::from_size_val(src.size(), 0).unwrap();
/// complement(&src, &mut dst).unwrap();
/// assert_eq!(dst.as_slice(), &[255, 155, 0]);
/// ```
pub fn complement(src: &GrayImage, dst: &mut GrayImage) -> Result<(), ImageError> {
    check_sizes(src, dst)?;
    parallel::par_iter_rows_val(src, dst, |&s, d| *d = 255 - s);
    Ok(())
}

/// Slope and intercept of the linear map sending `lo` to 0 and `hi` to 255.
///
/// Returns the identity map when `hi <= lo`.
pub fn stretch_coefficients(lo: u8, hi: u8) -> (f64, f64) {
    if hi <= lo {
        return (1.0, 0.0);
    }
    let m = 255.0 / (hi as f64 - lo as f64);
    (m, -m * lo as f64)
}

/// Linear contrast stretch of the occupied gray range onto `[0, 255]`.
///
/// The extrema come from the image histogram; a flat image is copied unchanged.
pub fn contrast_stretch(src: &GrayImage, dst: &mut GrayImage) -> Result<(), ImageError> {
    check_sizes(src, dst)?;

    let hist = GrayHistogram::from_image(src);
    let (m, b) = match hist.min_max() {
        Some((lo, hi)) => stretch_coefficients(lo, hi),
        None => (1.0, 0.0),
    };

    let mut lut = [0u8; GRAY_BINS];
    for (g, out) in lut.iter_mut().enumerate() {
        *out = (m * g as f64 + b).round().clamp(0.0, 255.0) as u8;
    }

    apply_lut(src, dst, &lut)
}

/// Lookup table that equalizes the given histogram.
pub fn equalization_lut(hist: &GrayHistogram) -> GrayLut {
    let mut lut = [0u8; GRAY_BINS];
    let total = hist.total();
    if total == 0 {
        return lut;
    }
    let cdf = hist.cumulative();
    for (out, &c) in lut.iter_mut().zip(cdf.iter()) {
        *out = (c * 255 / total).min(255) as u8;
    }
    lut
}

/// Histogram equalization: the scaled cumulative histogram used as a lookup table.
pub fn equalize_histogram(src: &GrayImage, dst: &mut GrayImage) -> Result<(), ImageError> {
    check_sizes(src, dst)?;
    let lut = equalization_lut(&GrayHistogram::from_image(src));
    apply_lut(src, dst, &lut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complement_is_involutive() -> Result<(), ImageError> {
        let src = GrayImage::new([256, 1].into(), (0..=255u8).collect())?;
        let mut once = GrayImage::from_size_val(src.size(), 0)?;
        let mut twice = GrayImage::from_size_val(src.size(), 0)?;
        complement(&src, &mut once)?;
        complement(&once, &mut twice)?;
        assert_eq!(twice, src);
        assert_eq!(once.as_slice()[0], 255);
        Ok(())
    }

    #[test]
    fn stretch_maps_extrema() -> Result<(), ImageError> {
        let src = GrayImage::new([4, 1].into(), vec![50, 90, 150, 90])?;
        let mut dst = GrayImage::from_size_val(src.size(), 0)?;
        contrast_stretch(&src, &mut dst)?;
        assert_eq!(dst.as_slice(), &[0, 102, 255, 102]);
        Ok(())
    }

    #[test]
    fn stretch_flat_image() -> Result<(), ImageError> {
        let src = GrayImage::from_size_val([3, 3].into(), 42)?;
        let mut dst = GrayImage::from_size_val(src.size(), 0)?;
        contrast_stretch(&src, &mut dst)?;
        assert_eq!(dst, src);
        Ok(())
    }

    #[test]
    fn coefficients() {
        let (m, b) = stretch_coefficients(0, 255);
        approx::assert_relative_eq!(m, 1.0);
        approx::assert_relative_eq!(b, 0.0);

        let (m, b) = stretch_coefficients(10, 60);
        approx::assert_relative_eq!(m, 5.1);
        approx::assert_relative_eq!(m * 10.0 + b, 0.0, epsilon = 1e-9);
        approx::assert_relative_eq!(m * 60.0 + b, 255.0, epsilon = 1e-9);
    }

    #[test]
    fn equalize_two_levels() -> Result<(), ImageError> {
        let src = GrayImage::new([4, 1].into(), vec![10, 10, 20, 20])?;
        let mut dst = GrayImage::from_size_val(src.size(), 0)?;
        equalize_histogram(&src, &mut dst)?;
        // cdf(10) = 2 of 4, cdf(20) = 4 of 4
        assert_eq!(dst.as_slice(), &[127, 127, 255, 255]);
        Ok(())
    }

    #[test]
    fn equalize_is_monotonic() -> Result<(), ImageError> {
        let src = GrayImage::new([8, 1].into(), vec![0, 3, 3, 9, 100, 100, 100, 250])?;
        let lut = equalization_lut(&GrayHistogram::from_image(&src));
        assert!(lut.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(lut[250], 255);
        Ok(())
    }
}
