use serde::{Deserialize, Serialize};

/// A 2-D point `[x, y]` in pixel coordinates.
pub type Point2 = [f64; 2];

/// A point picked in both images.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Position in the first (left) image.
    pub image1: Point2,
    /// Position in the second (right) image.
    pub image2: Point2,
    /// Whether the landmark may be used by the solvers.
    pub valid: bool,
}

impl Landmark {
    /// Create a valid landmark.
    pub fn new(image1: Point2, image2: Point2) -> Self {
        Self {
            image1,
            image2,
            valid: true,
        }
    }

    /// The correspondence as `(from, to)`; `flip` swaps the roles of the two images.
    pub fn pair(&self, flip: bool) -> (Point2, Point2) {
        if flip {
            (self.image2, self.image1)
        } else {
            (self.image1, self.image2)
        }
    }
}

/// The landmark table shared by both image sides.
///
/// # Example
///
/// ```
/// use flicker_align::{Landmark, LandmarkTable};
///
/// let mut table = LandmarkTable::default();
/// table.push(Landmark::new([10.0, 10.0], [20.0, 20.0]));
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.correspondences(true), (vec![[20.0, 20.0]], vec![[10.0, 10.0]]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkTable {
    landmarks: Vec<Landmark>,
}

impl LandmarkTable {
    /// Create a table from a list of landmarks.
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    /// Append a landmark.
    pub fn push(&mut self, landmark: Landmark) {
        self.landmarks.push(landmark);
    }

    /// Number of landmarks, valid or not.
    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    /// Whether the table holds no landmarks.
    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// Landmark at `index`.
    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)
    }

    /// Iterate over all landmarks.
    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.landmarks.iter()
    }

    /// Number of valid landmarks.
    pub fn valid_count(&self) -> usize {
        self.landmarks.iter().filter(|l| l.valid).count()
    }

    /// Source and target points of every valid landmark.
    pub fn correspondences(&self, flip: bool) -> (Vec<Point2>, Vec<Point2>) {
        self.landmarks
            .iter()
            .filter(|l| l.valid)
            .map(|l| l.pair(flip))
            .unzip()
    }

    /// Points of every landmark in one image, `second` selecting the second image.
    pub fn points(&self, second: bool) -> Vec<Point2> {
        self.landmarks
            .iter()
            .map(|l| if second { l.image2 } else { l.image1 })
            .collect()
    }
}

/// Landmark overlay coordinates of one image side.
///
/// `input` holds the positions in the untouched image and `mapped` the positions
/// in the currently displayed (warped) raster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkOverlaySet {
    input: Vec<Point2>,
    mapped: Vec<Point2>,
}

impl LandmarkOverlaySet {
    /// Overlay with `mapped` equal to `input`.
    pub fn new(input: Vec<Point2>) -> Self {
        Self {
            mapped: input.clone(),
            input,
        }
    }

    /// Positions in input space.
    pub fn input(&self) -> &[Point2] {
        &self.input
    }

    /// Positions in mapped space.
    pub fn mapped(&self) -> &[Point2] {
        &self.mapped
    }

    /// A copy of this overlay with every mapped point passed through `f`.
    pub fn remapped(&self, f: impl Fn(Point2) -> Point2) -> Self {
        Self {
            input: self.input.clone(),
            mapped: self.mapped.iter().map(|&p| f(p)).collect(),
        }
    }

    /// Drop any warp applied to the mapped points.
    pub fn reset(&mut self) {
        self.mapped.clone_from(&self.input);
    }
}
