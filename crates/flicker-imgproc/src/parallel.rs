use rayon::prelude::*;

use flicker_image::Image;

/// Apply a function to each element of the image in parallel, by rows.
pub fn par_iter_rows_val<T1, const C1: usize, T2, const C2: usize>(
    src: &Image<T1, C1>,
    dst: &mut Image<T2, C2>,
    f: impl Fn(&T1, &mut T2) + Send + Sync,
) where
    T1: Send + Sync,
    T2: Send + Sync,
{
    let cols = src.cols();
    if cols == 0 {
        return;
    }
    src.as_slice()
        .par_chunks_exact(C1 * cols)
        .zip(dst.as_slice_mut().par_chunks_exact_mut(C2 * cols))
        .for_each(|(src_chunk, dst_chunk)| {
            src_chunk
                .iter()
                .zip(dst_chunk.iter_mut())
                .for_each(|(src_pixel, dst_pixel)| {
                    f(src_pixel, dst_pixel);
                });
        });
}

/// Apply a function to each destination row in parallel, passing the row index.
///
/// Used by operators that read a neighborhood of the source around each output row.
pub fn par_iter_dst_rows<T, const C: usize>(
    dst: &mut Image<T, C>,
    f: impl Fn(usize, &mut [T]) + Send + Sync,
) where
    T: Send + Sync,
{
    let cols = dst.cols();
    if cols == 0 {
        return;
    }
    dst.as_slice_mut()
        .par_chunks_exact_mut(C * cols)
        .enumerate()
        .for_each(|(row, dst_row)| f(row, dst_row));
}

#[cfg(test)]
mod tests {
    use super::*;
    use flicker_image::ImageError;

    #[test]
    fn rows_val() -> Result<(), ImageError> {
        let src = Image::<u8, 1>::new([2, 2].into(), vec![1, 2, 3, 4])?;
        let mut dst = Image::<u16, 1>::from_size_val(src.size(), 0)?;
        par_iter_rows_val(&src, &mut dst, |s, d| *d = *s as u16 * 2);
        assert_eq!(dst.as_slice(), &[2, 4, 6, 8]);
        Ok(())
    }

    #[test]
    fn dst_rows_index() -> Result<(), ImageError> {
        let mut dst = Image::<usize, 1>::from_size_val([3, 2].into(), 0)?;
        par_iter_dst_rows(&mut dst, |row, out| out.iter_mut().for_each(|v| *v = row));
        assert_eq!(dst.as_slice(), &[0, 0, 0, 1, 1, 1]);
        Ok(())
    }
}
