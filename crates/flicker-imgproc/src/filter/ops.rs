use flicker_image::{GrayImage, ImageError};

use super::kernels::{apply_kernel3, GRADIENT_KERNELS};
use crate::neighborhood::{Neighborhood, Sampler3x3};
use crate::parallel;

/// Run a 3x3 neighborhood operator over every pixel of `src` and write the clamped result to `dst`.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
pub fn filter3x3<F>(src: &GrayImage, dst: &mut GrayImage, op: F) -> Result<(), ImageError>
where
    F: Fn(&Neighborhood) -> i32 + Send + Sync,
{
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    parallel::par_iter_dst_rows(dst, |y, dst_row| {
        let mut sampler = Sampler3x3::new(src);
        for (x, out) in dst_row.iter_mut().enumerate() {
            *out = op(&sampler.sample(x, y)).clamp(0, 255) as u8;
        }
    });

    Ok(())
}

/// Maximum absolute response of the four directional gradient kernels.
pub fn gradient_response(hood: &Neighborhood) -> i32 {
    GRADIENT_KERNELS
        .iter()
        .map(|k| apply_kernel3(k, hood).abs())
        .max()
        .unwrap_or(0)
}

/// Inverted Laplacian: `255 - |8 * center - sum(neighbors)|`.
pub fn laplacian_response(hood: &Neighborhood) -> i32 {
    255 - (8 * hood.center - hood.ring_sum()).abs()
}

/// Blend the center with an operator response, `e_scale` in percent.
fn blend(center: i32, response: i32, e_scale: u8) -> i32 {
    let e = e_scale.min(100) as i32;
    ((100 - e) * center + e * response) / 100
}

/// Median of the nine values, found by discarding the four largest.
pub fn median_response(hood: &Neighborhood) -> i32 {
    let mut values = hood.values();
    for _ in 0..4 {
        let mut imax = 0;
        for (i, v) in values.iter().enumerate() {
            if *v > values[imax] {
                imax = i;
            }
        }
        // gray values are never negative
        values[imax] = -1;
    }
    values.iter().copied().max().unwrap_or(0)
}

/// Compute the directional gradient magnitude of an image.
///
/// Each output pixel is the largest absolute response of the 0, 45, 90 and 135
/// degree difference kernels.
///
/// # Arguments
///
/// * `src` - The source gray image.
/// * `dst` - The destination gray image.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
///
/// # Example
///
/// ```
/// use flicker_image::GrayImage;
/// use flicker_imgproc::filter::gradient;
///
/// let src = GrayImage::from_size_val([4, 4].into(), 0).unwrap();
/// let mut dst = GrayImage::from_size_val(src.size(), 9).unwrap();
/// gradient(&src, &mut dst).unwrap();
/// assert!(dst.as_slice().iter().all(|&v| v == 0));
/// ```
pub fn gradient(src: &GrayImage, dst: &mut GrayImage) -> Result<(), ImageError> {
    filter3x3(src, dst, gradient_response)
}

/// Compute the inverted Laplacian of an image, `255 - |8 * center - sum(neighbors)|`.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
pub fn laplacian(src: &GrayImage, dst: &mut GrayImage) -> Result<(), ImageError> {
    filter3x3(src, dst, laplacian_response)
}

/// Sharpen by blending each pixel with its clamped gradient response.
///
/// `dst = ((100 - e_scale) * center + e_scale * gradient) / 100`, with integer division.
///
/// # Arguments
///
/// * `src` - The source gray image.
/// * `dst` - The destination gray image.
/// * `e_scale` - Weight of the gradient in percent, clamped to 100.
pub fn sharpen_gradient(
    src: &GrayImage,
    dst: &mut GrayImage,
    e_scale: u8,
) -> Result<(), ImageError> {
    filter3x3(src, dst, |hood| {
        let response = gradient_response(hood).clamp(0, 255);
        blend(hood.center, response, e_scale)
    })
}

/// Sharpen by blending each pixel with its clamped Laplacian response.
///
/// `dst = ((100 - e_scale) * center + e_scale * laplacian) / 100`, with integer division.
pub fn sharpen_laplacian(
    src: &GrayImage,
    dst: &mut GrayImage,
    e_scale: u8,
) -> Result<(), ImageError> {
    filter3x3(src, dst, |hood| {
        let response = laplacian_response(hood).clamp(0, 255);
        blend(hood.center, response, e_scale)
    })
}

/// Mean of the 3x3 neighborhood, truncated.
pub fn average(src: &GrayImage, dst: &mut GrayImage) -> Result<(), ImageError> {
    filter3x3(src, dst, |hood| hood.values().iter().sum::<i32>() / 9)
}

/// Median of the 3x3 neighborhood.
pub fn median(src: &GrayImage, dst: &mut GrayImage) -> Result<(), ImageError> {
    filter3x3(src, dst, median_response)
}

/// Maximum of the 3x3 neighborhood.
pub fn max3x3(src: &GrayImage, dst: &mut GrayImage) -> Result<(), ImageError> {
    filter3x3(src, dst, |hood| {
        hood.values().iter().copied().max().unwrap_or(0)
    })
}

/// Minimum of the 3x3 neighborhood.
pub fn min3x3(src: &GrayImage, dst: &mut GrayImage) -> Result<(), ImageError> {
    filter3x3(src, dst, |hood| {
        hood.values().iter().copied().min().unwrap_or(0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(
        f: fn(&GrayImage, &mut GrayImage) -> Result<(), ImageError>,
        src: &GrayImage,
    ) -> Result<GrayImage, ImageError> {
        let mut dst = GrayImage::from_size_val(src.size(), 0)?;
        f(src, &mut dst)?;
        Ok(dst)
    }

    #[test]
    fn size_mismatch() -> Result<(), ImageError> {
        let src = GrayImage::from_size_val([3, 3].into(), 0)?;
        let mut dst = GrayImage::from_size_val([2, 3].into(), 0)?;
        assert!(gradient(&src, &mut dst).is_err());
        Ok(())
    }

    #[test]
    fn gradient_of_constant_is_zero_inside() -> Result<(), ImageError> {
        let src = GrayImage::from_size_val([5, 5].into(), 100)?;
        let dst = run(gradient, &src)?;
        assert_eq!(dst.get_pixel(2, 2, 0)?, 0);
        // zero fill beyond the edge makes the border respond
        assert_eq!(dst.get_pixel(0, 2, 0)?, 255);
        Ok(())
    }

    #[test]
    fn gradient_vertical_edge() -> Result<(), ImageError> {
        #[rustfmt::skip]
        let src = GrayImage::new(
            [4, 3].into(),
            vec![
                0, 0, 10, 10,
                0, 0, 10, 10,
                0, 0, 10, 10,
            ],
        )?;
        let dst = run(gradient, &src)?;
        // 0 degree kernel: (10 + 2 * 10 + 10) - 0
        assert_eq!(dst.get_pixel(1, 1, 0)?, 40);
        Ok(())
    }

    #[test]
    fn laplacian_flat_is_white() -> Result<(), ImageError> {
        let src = GrayImage::from_size_val([3, 3].into(), 50)?;
        let dst = run(laplacian, &src)?;
        assert_eq!(dst.get_pixel(1, 1, 0)?, 255);
        // corner: |8 * 50 - 3 * 50| = 250
        assert_eq!(dst.get_pixel(0, 0, 0)?, 5);
        Ok(())
    }

    #[test]
    fn laplacian_spike() -> Result<(), ImageError> {
        let mut src = GrayImage::from_size_val([3, 3].into(), 0)?;
        src.set_pixel(1, 1, 0, 20)?;
        let dst = run(laplacian, &src)?;
        assert_eq!(dst.get_pixel(1, 1, 0)?, 255 - 160);
        assert_eq!(dst.get_pixel(0, 1, 0)?, 255 - 20);
        Ok(())
    }

    #[test]
    fn sharpen_scale_bounds() -> Result<(), ImageError> {
        #[rustfmt::skip]
        let src = GrayImage::new(
            [3, 3].into(),
            vec![
                0, 0, 0,
                0, 30, 0,
                0, 0, 0,
            ],
        )?;

        let mut dst = GrayImage::from_size_val(src.size(), 0)?;
        sharpen_gradient(&src, &mut dst, 0)?;
        assert_eq!(dst, src);

        sharpen_laplacian(&src, &mut dst, 0)?;
        assert_eq!(dst, src);

        let mut lap = GrayImage::from_size_val(src.size(), 0)?;
        laplacian(&src, &mut lap)?;
        sharpen_laplacian(&src, &mut dst, 100)?;
        assert_eq!(dst, lap);

        // ((100 - 50) * 30 + 50 * (255 - 240)) / 100
        sharpen_laplacian(&src, &mut dst, 50)?;
        assert_eq!(dst.get_pixel(1, 1, 0)?, 22);
        Ok(())
    }

    #[test]
    fn average_truncates() -> Result<(), ImageError> {
        let mut src = GrayImage::from_size_val([3, 3].into(), 1)?;
        src.set_pixel(1, 1, 0, 9)?;
        let dst = run(average, &src)?;
        // (8 + 9) / 9
        assert_eq!(dst.get_pixel(1, 1, 0)?, 1);
        // corner: (1 + 1 + 9 + 1) / 9
        assert_eq!(dst.get_pixel(0, 0, 0)?, 1);
        Ok(())
    }

    #[test]
    fn median_uniform_block() -> Result<(), ImageError> {
        let v = 77;
        let src = GrayImage::from_size_val([6, 5].into(), v)?;
        let dst = run(median, &src)?;

        for y in 0..5 {
            for x in 0..6 {
                let corner = (x == 0 || x == 5) && (y == 0 || y == 4);
                let expected = if corner { 0 } else { v };
                assert_eq!(dst.get_pixel(x, y, 0)?, expected, "at ({x}, {y})");
            }
        }
        Ok(())
    }

    #[test]
    fn median_removes_spike() -> Result<(), ImageError> {
        #[rustfmt::skip]
        let src = GrayImage::new(
            [3, 3].into(),
            vec![
                1, 2, 3,
                4, 255, 6,
                7, 8, 9,
            ],
        )?;
        let dst = run(median, &src)?;
        assert_eq!(dst.get_pixel(1, 1, 0)?, 6);
        Ok(())
    }

    #[test]
    fn max_min() -> Result<(), ImageError> {
        #[rustfmt::skip]
        let src = GrayImage::new(
            [3, 3].into(),
            vec![
                5, 6, 7,
                8, 9, 10,
                11, 12, 13,
            ],
        )?;
        let hi = run(max3x3, &src)?;
        let lo = run(min3x3, &src)?;
        assert_eq!(hi.get_pixel(1, 1, 0)?, 13);
        assert_eq!(lo.get_pixel(1, 1, 0)?, 5);
        // off-edge neighbors read as zero
        assert_eq!(lo.get_pixel(0, 0, 0)?, 0);
        assert_eq!(hi.get_pixel(0, 0, 0)?, 9);
        Ok(())
    }
}
