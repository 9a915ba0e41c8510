use flicker_image::{Image, ImageError};
use rayon::prelude::*;

/// Crop an image to a specified region.
///
/// # Arguments
///
/// * `src` - The source image to crop.
/// * `dst` - The destination image; its size is the size of the region.
/// * `x` - The x-coordinate of the top-left corner of the region to crop.
/// * `y` - The y-coordinate of the top-left corner of the region to crop.
///
/// # Errors
///
/// Returns an error if the region does not fit inside `src`.
///
/// # Examples
///
/// ```rust
/// use flicker_image::{Image, ImageSize};
/// use flicker_imgproc::crop::crop_image;
///
/// let image = Image::<_, 1>::new(ImageSize { width: 4, height: 4 }, vec![
///     0u8, 1, 2, 3,
///     4u8, 5, 6, 7,
///     8u8, 9, 10, 11,
///     12u8, 13, 14, 15
/// ]).unwrap();
///
/// let mut cropped = Image::<_, 1>::from_size_val(ImageSize { width: 2, height: 2 }, 0u8).unwrap();
///
/// crop_image(&image, &mut cropped, 1, 1).unwrap();
///
/// assert_eq!(cropped.as_slice(), &[5u8, 6, 9, 10]);
/// ```
pub fn crop_image<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    x: usize,
    y: usize,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync,
{
    if x + dst.cols() > src.cols() || y + dst.rows() > src.rows() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            x + dst.cols(),
            y + dst.rows(),
        ));
    }

    let dst_cols = dst.cols();
    if dst_cols == 0 {
        return Ok(());
    }

    dst.as_slice_mut()
        .par_chunks_exact_mut(dst_cols * C)
        .enumerate()
        .for_each(|(i, dst_row)| {
            let offset = ((y + i) * src.cols() + x) * C;
            dst_row.copy_from_slice(&src.as_slice()[offset..offset + dst_cols * C]);
        });

    Ok(())
}

/// Copy `src` into `dst` with its top-left corner at `(x, y)`.
///
/// # Errors
///
/// Returns an error if `src` does not fit inside `dst` at that position.
pub fn paste_image<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    x: usize,
    y: usize,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync,
{
    if x + src.cols() > dst.cols() || y + src.rows() > dst.rows() {
        return Err(ImageError::InvalidImageSize(
            x + src.cols(),
            y + src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    let src_cols = src.cols();
    if src_cols == 0 {
        return Ok(());
    }
    let dst_cols = dst.cols();

    dst.as_slice_mut()
        .par_chunks_exact_mut(dst_cols * C)
        .skip(y)
        .zip(src.as_slice().par_chunks_exact(src_cols * C))
        .for_each(|(dst_row, src_row)| {
            dst_row[x * C..(x + src_cols) * C].copy_from_slice(src_row);
        });

    Ok(())
}
