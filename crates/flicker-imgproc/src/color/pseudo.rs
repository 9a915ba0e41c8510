use flicker_image::{packed, GrayImage, ImageError, Raster};

use crate::parallel;

/// Pseudocolor of one gray value: blue = g, green = max(0, g - 128), red = 255 - g.
pub fn pseudocolor_of(g: u8) -> u32 {
    packed::pack_rgb(255 - g, g.saturating_sub(128), g)
}

/// Map a gray image onto the blue/green/red pseudocolor scale.
///
/// Precondition: the input and output images must have the same size.
pub fn pseudocolor(src: &GrayImage, dst: &mut Raster) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    parallel::par_iter_rows_val(src, dst, |&g, out| *out = pseudocolor_of(g));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flicker_image::packed::unpack_rgb;

    #[test]
    fn scale_endpoints() -> Result<(), ImageError> {
        let src = GrayImage::new([3, 1].into(), vec![0, 128, 255])?;
        let mut dst = Raster::from_size_val(src.size(), 0)?;
        pseudocolor(&src, &mut dst)?;

        let rgb: Vec<_> = dst.as_slice().iter().map(|&p| unpack_rgb(p)).collect();
        assert_eq!(rgb, vec![(255, 0, 0), (127, 0, 128), (0, 127, 255)]);
        Ok(())
    }
}
