use flicker_image::GrayImage;

/// Ring position of the east (right) neighbor.
pub const E: usize = 0;
/// Ring position of the south-east neighbor.
pub const SE: usize = 1;
/// Ring position of the south neighbor.
pub const S: usize = 2;
/// Ring position of the south-west neighbor.
pub const SW: usize = 3;
/// Ring position of the west neighbor.
pub const W: usize = 4;
/// Ring position of the north-west neighbor.
pub const NW: usize = 5;
/// Ring position of the north neighbor.
pub const N: usize = 6;
/// Ring position of the north-east neighbor.
pub const NE: usize = 7;

/// The gray values of a 3x3 neighborhood.
///
/// `ring` runs clockwise (with y pointing down) starting at the right neighbor;
/// neighbors outside the image read as 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighborhood {
    /// The center pixel.
    pub center: i32,
    /// The eight neighbors, indexed by [`E`], [`SE`], ... [`NE`].
    pub ring: [i32; 8],
}

impl Neighborhood {
    /// All nine values: the ring in clockwise order followed by the center.
    pub fn values(&self) -> [i32; 9] {
        let r = &self.ring;
        [r[0], r[1], r[2], r[3], r[4], r[5], r[6], r[7], self.center]
    }

    /// Sum of the eight neighbors.
    pub fn ring_sum(&self) -> i32 {
        self.ring.iter().sum()
    }
}

/// Extracts 3x3 neighborhoods from a gray image with zero fill beyond the edges.
///
/// The row offsets of the previous, current and next rows are cached, so scanning
/// an image in raster order only recomputes them once per row.
///
/// # Example
///
/// ```
/// use flicker_image::GrayImage;
/// use flicker_imgproc::neighborhood::{Sampler3x3, E, S};
///
/// let image = GrayImage::new([2, 2].into(), vec![1, 2, 3, 4]).unwrap();
/// let mut sampler = Sampler3x3::new(&image);
/// let hood = sampler.sample(0, 0);
/// assert_eq!(hood.center, 1);
/// assert_eq!(hood.ring[E], 2);
/// assert_eq!(hood.ring[S], 3);
/// ```
pub struct Sampler3x3<'a> {
    data: &'a [u8],
    cols: usize,
    rows: usize,
    row: Option<usize>,
    prev: Option<usize>,
    cur: usize,
    next: Option<usize>,
}

impl<'a> Sampler3x3<'a> {
    /// Create a sampler over `src`.
    pub fn new(src: &'a GrayImage) -> Self {
        Self {
            data: src.as_slice(),
            cols: src.cols(),
            rows: src.rows(),
            row: None,
            prev: None,
            cur: 0,
            next: None,
        }
    }

    fn seek_row(&mut self, y: usize) {
        if self.row == Some(y) {
            return;
        }
        self.row = Some(y);
        self.cur = y * self.cols;
        self.prev = (y > 0).then(|| self.cur - self.cols);
        self.next = (y + 1 < self.rows).then(|| self.cur + self.cols);
    }

    #[inline]
    fn read(&self, base: Option<usize>, x: usize, dx: isize) -> i32 {
        let Some(base) = base else {
            return 0;
        };
        let xx = x as isize + dx;
        if xx < 0 || xx as usize >= self.cols {
            return 0;
        }
        self.data[base + xx as usize] as i32
    }

    /// Sample the neighborhood centered at `(x, y)`.
    ///
    /// PRECONDITION: `(x, y)` lies inside the image.
    pub fn sample(&mut self, x: usize, y: usize) -> Neighborhood {
        debug_assert!(x < self.cols && y < self.rows);
        self.seek_row(y);

        let (prev, cur, next) = (self.prev, Some(self.cur), self.next);

        let mut ring = [0i32; 8];
        ring[E] = self.read(cur, x, 1);
        ring[SE] = self.read(next, x, 1);
        ring[S] = self.read(next, x, 0);
        ring[SW] = self.read(next, x, -1);
        ring[W] = self.read(cur, x, -1);
        ring[NW] = self.read(prev, x, -1);
        ring[N] = self.read(prev, x, 0);
        ring[NE] = self.read(prev, x, 1);

        Neighborhood {
            center: self.read(cur, x, 0),
            ring,
        }
    }
}
