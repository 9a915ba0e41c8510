use flicker_image::GrayImage;
use rayon::prelude::*;

/// Number of bins of an 8-bit gray histogram.
pub const GRAY_BINS: usize = 256;

/// A 256-bin histogram of 8-bit gray values.
///
/// # Example
///
/// ```
/// use flicker_image::GrayImage;
/// use flicker_imgproc::histogram::GrayHistogram;
///
/// let image = GrayImage::new([3, 1].into(), vec![4, 4, 250]).unwrap();
/// let hist = GrayHistogram::from_image(&image);
/// assert_eq!(hist.bins()[4], 2);
/// assert_eq!(hist.min_max(), Some((4, 250)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayHistogram {
    bins: [u64; GRAY_BINS],
}

impl GrayHistogram {
    /// Count the gray values of an image.
    pub fn from_image(src: &GrayImage) -> Self {
        let bins = src
            .as_slice()
            .par_chunks(4096)
            .fold(
                || [0u64; GRAY_BINS],
                |mut local, chunk| {
                    for &px in chunk {
                        local[px as usize] += 1;
                    }
                    local
                },
            )
            .reduce(
                || [0u64; GRAY_BINS],
                |mut a, b| {
                    a.iter_mut().zip(b.iter()).for_each(|(x, y)| *x += y);
                    a
                },
            );

        Self { bins }
    }

    /// The bin counts.
    pub fn bins(&self) -> &[u64; GRAY_BINS] {
        &self.bins
    }

    /// Total number of counted pixels.
    pub fn total(&self) -> u64 {
        self.bins.iter().sum()
    }

    /// The smallest and largest occupied gray values, or `None` for an empty histogram.
    pub fn min_max(&self) -> Option<(u8, u8)> {
        let lo = self.bins.iter().position(|&c| c > 0)?;
        let hi = self.bins.iter().rposition(|&c| c > 0)?;
        Some((lo as u8, hi as u8))
    }

    /// Running sum of the bins.
    pub fn cumulative(&self) -> [u64; GRAY_BINS] {
        let mut cdf = [0u64; GRAY_BINS];
        let mut acc = 0;
        for (c, &b) in cdf.iter_mut().zip(self.bins.iter()) {
            acc += b;
            *c = acc;
        }
        cdf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flicker_image::ImageError;

    #[test]
    fn gray_histogram_stats() -> Result<(), ImageError> {
        let image = GrayImage::new([4, 1].into(), vec![10, 10, 20, 200])?;
        let hist = GrayHistogram::from_image(&image);
        assert_eq!(hist.total(), 4);
        assert_eq!(hist.bins()[10], 2);
        assert_eq!(hist.min_max(), Some((10, 200)));

        let cdf = hist.cumulative();
        assert_eq!(cdf[9], 0);
        assert_eq!(cdf[10], 2);
        assert_eq!(cdf[199], 3);
        assert_eq!(cdf[255], 4);
        Ok(())
    }

    #[test]
    fn empty_histogram() -> Result<(), ImageError> {
        let image = GrayImage::new([0, 0].into(), vec![])?;
        assert_eq!(GrayHistogram::from_image(&image).min_max(), None);
        Ok(())
    }
}
