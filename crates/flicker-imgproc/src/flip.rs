use flicker_image::{Image, ImageError};
use rayon::prelude::*;

fn check_sizes<T, const C: usize>(src: &Image<T, C>, dst: &Image<T, C>) -> Result<(), ImageError> {
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

/// Mirror the image left to right.
///
/// # Arguments
///
/// * `src` - The input image with shape (H, W, C).
/// * `dst` - The output image with shape (H, W, C).
///
/// # Example
///
/// ```
/// use flicker_image::Image;
/// use flicker_imgproc::flip::horizontal_flip;
///
/// let image = Image::<u8, 1>::new([2, 3].into(), vec![0, 1, 2, 3, 4, 5]).unwrap();
/// let mut flipped = Image::<u8, 1>::from_size_val(image.size(), 0).unwrap();
/// horizontal_flip(&image, &mut flipped).unwrap();
/// assert_eq!(flipped.as_slice(), &[1, 0, 3, 2, 5, 4]);
/// ```
pub fn horizontal_flip<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync,
{
    check_sizes(src, dst)?;
    let stride = src.cols() * C;
    if stride == 0 {
        return Ok(());
    }

    dst.as_slice_mut()
        .par_chunks_exact_mut(stride)
        .zip_eq(src.as_slice().par_chunks_exact(stride))
        .for_each(|(dst_row, src_row)| {
            dst_row
                .chunks_exact_mut(C)
                .zip(src_row.chunks_exact(C).rev())
                .for_each(|(dst_pixel, src_pixel)| dst_pixel.copy_from_slice(src_pixel));
        });

    Ok(())
}

/// Mirror the image top to bottom.
pub fn vertical_flip<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync,
{
    check_sizes(src, dst)?;
    let stride = src.cols() * C;
    if stride == 0 {
        return Ok(());
    }

    dst.as_slice_mut()
        .par_chunks_exact_mut(stride)
        .zip_eq(src.as_slice().par_chunks_exact(stride).rev())
        .for_each(|(dst_row, src_row)| dst_row.copy_from_slice(src_row));

    Ok(())
}

#[cfg(test)]
mod tests {
    use flicker_image::{Image, ImageError};

    #[test]
    fn test_hflip() -> Result<(), ImageError> {
        let image = Image::<_, 1>::new([2, 3].into(), vec![0u8, 1, 2, 3, 4, 5])?;
        let mut flipped = Image::<_, 1>::from_size_val(image.size(), 0u8)?;
        super::horizontal_flip(&image, &mut flipped)?;
        assert_eq!(flipped.as_slice(), &[1u8, 0, 3, 2, 5, 4]);
        Ok(())
    }

    #[test]
    fn test_vflip() -> Result<(), ImageError> {
        let image = Image::<_, 1>::new([2, 3].into(), vec![0u8, 1, 2, 3, 4, 5])?;
        let mut flipped = Image::<_, 1>::from_size_val(image.size(), 0u8)?;
        super::vertical_flip(&image, &mut flipped)?;
        assert_eq!(flipped.as_slice(), &[4u8, 5, 2, 3, 0, 1]);
        Ok(())
    }

    #[test]
    fn test_hflip_packed() -> Result<(), ImageError> {
        let image = Image::<u32, 1>::new([3, 1].into(), vec![7, 8, 9])?;
        let mut flipped = Image::<u32, 1>::from_size_val(image.size(), 0)?;
        super::horizontal_flip(&image, &mut flipped)?;
        assert_eq!(flipped.as_slice(), &[9, 8, 7]);
        Ok(())
    }
}
