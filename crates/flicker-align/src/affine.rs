use serde::{Deserialize, Serialize};

use crate::error::AlignError;
use crate::landmark::{LandmarkTable, Point2};

/// Colinearity residual of three points.
///
/// The root mean of the smaller of the x and y variances about the centroid,
/// `sqrt(min(sum dx^2, sum dy^2) / 3)`. Zero for points on a horizontal or
/// vertical line; diagonal lines are caught by the solver's determinant check.
///
/// # Example
///
/// ```
/// use flicker_align::colinearity_residual;
///
/// assert_eq!(colinearity_residual(&[[0.0, 5.0], [3.0, 5.0], [9.0, 5.0]]), 0.0);
/// assert!(colinearity_residual(&[[10.0, 10.0], [50.0, 10.0], [10.0, 50.0]]) > 16.0);
/// ```
pub fn colinearity_residual(points: &[Point2; 3]) -> f64 {
    let n = points.len() as f64;
    let mx = points.iter().map(|p| p[0]).sum::<f64>() / n;
    let my = points.iter().map(|p| p[1]).sum::<f64>() / n;

    let sxx: f64 = points.iter().map(|p| (p[0] - mx).powi(2)).sum();
    let syy: f64 = points.iter().map(|p| (p[1] - my).powi(2)).sum();

    (sxx.min(syy) / n).sqrt()
}

/// A solved affine correspondence between two images.
///
/// `forward = [a, b, c, d, e, f]` maps image 1 to image 2:
///
/// ```text
/// x2 = a * x1 + b * y1 + c
/// y2 = d * x1 + e * y1 + f
/// ```
///
/// and `inverse = [a0, b0, c0, d0, e0, f0]` maps back. Mapped points are clamped
/// to the image bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffineModel {
    /// Forward coefficients `a..f`.
    pub forward: [f64; 6],
    /// Inverse coefficients `a0..f0`.
    pub inverse: [f64; 6],
    /// Colinearity residual of the landmarks in the first image.
    pub residual1: f64,
    /// Colinearity residual of the landmarks in the second image.
    pub residual2: f64,
    /// Human readable status of the solve.
    pub status: String,
    /// Image width used for clamping.
    pub width: usize,
    /// Image height used for clamping.
    pub height: usize,
}

const IDENTITY: [f64; 6] = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0];

fn apply(coeffs: &[f64; 6], x: f64, y: f64) -> (f64, f64) {
    let [a, b, c, d, e, f] = *coeffs;
    (a * x + b * y + c, d * x + e * y + f)
}

impl AffineModel {
    /// The identity map over an image of the given size.
    pub fn identity(width: usize, height: usize) -> Self {
        Self {
            forward: IDENTITY,
            inverse: IDENTITY,
            residual1: 0.0,
            residual2: 0.0,
            status: "identity".to_string(),
            width,
            height,
        }
    }

    fn clamp(&self, (x, y): (f64, f64)) -> (f64, f64) {
        let max_x = self.width.saturating_sub(1) as f64;
        let max_y = self.height.saturating_sub(1) as f64;
        (x.clamp(0.0, max_x), y.clamp(0.0, max_y))
    }

    /// Map a point from image 1 to image 2.
    pub fn map_forward(&self, x: f64, y: f64) -> (f64, f64) {
        self.clamp(apply(&self.forward, x, y))
    }

    /// Map a point from image 2 to image 1.
    pub fn map_inverse(&self, x: f64, y: f64) -> (f64, f64) {
        self.clamp(apply(&self.inverse, x, y))
    }
}

/// Solves the affine map through three landmark pairs.
///
/// # Example
///
/// ```
/// use flicker_align::{AffineSolver, Landmark, LandmarkTable};
///
/// let table = LandmarkTable::new(vec![
///     Landmark::new([10.0, 10.0], [20.0, 20.0]),
///     Landmark::new([50.0, 10.0], [60.0, 20.0]),
///     Landmark::new([10.0, 50.0], [20.0, 60.0]),
/// ]);
///
/// let mut solver = AffineSolver::new(1.0, 100, 100);
/// solver.set_landmarks(&table, [0, 1, 2], false).unwrap();
/// let model = solver.solve().unwrap();
/// assert_eq!(model.map_forward(30.0, 30.0), (40.0, 40.0));
/// ```
#[derive(Debug, Clone)]
pub struct AffineSolver {
    colinear_threshold: f64,
    width: usize,
    height: usize,
    points: Option<([Point2; 3], [Point2; 3])>,
}

impl AffineSolver {
    /// Create a solver for images of the given size.
    ///
    /// Triples whose colinearity residual is below `colinear_threshold` in either
    /// image are rejected.
    pub fn new(colinear_threshold: f64, width: usize, height: usize) -> Self {
        Self {
            colinear_threshold,
            width,
            height,
            points: None,
        }
    }

    /// Load three landmarks from `table`; `flip` swaps the roles of the two images.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::InvalidLandmarks`] if the table has fewer than three
    /// landmarks, or an index is out of range, repeated or marks an invalid landmark.
    pub fn set_landmarks(
        &mut self,
        table: &LandmarkTable,
        indices: [usize; 3],
        flip: bool,
    ) -> Result<(), AlignError> {
        if table.len() < 3 {
            return Err(AlignError::InvalidLandmarks(format!(
                "3 landmarks required, table has {}",
                table.len()
            )));
        }

        let [i1, i2, i3] = indices;
        if i1 == i2 || i1 == i3 || i2 == i3 {
            return Err(AlignError::InvalidLandmarks(format!(
                "indices {indices:?} are not distinct"
            )));
        }

        let mut from = [[0.0; 2]; 3];
        let mut to = [[0.0; 2]; 3];
        for (k, &index) in indices.iter().enumerate() {
            let landmark = table.get(index).ok_or_else(|| {
                AlignError::InvalidLandmarks(format!(
                    "index {index} out of range for {} landmarks",
                    table.len()
                ))
            })?;
            if !landmark.valid {
                return Err(AlignError::InvalidLandmarks(format!(
                    "landmark {index} is not valid"
                )));
            }
            (from[k], to[k]) = landmark.pair(flip);
        }

        self.points = Some((from, to));
        Ok(())
    }

    /// Solve the forward and inverse maps.
    ///
    /// # Errors
    ///
    /// * [`AlignError::InvalidLandmarks`] if no landmarks were loaded.
    /// * [`AlignError::Colinear`] if the points in either image span no area or a
    ///   residual is below the threshold.
    /// * [`AlignError::SingularMatrix`] if the linear part cannot be inverted.
    pub fn solve(&self) -> Result<AffineModel, AlignError> {
        let (x1, x2) = self
            .points
            .as_ref()
            .ok_or_else(|| AlignError::InvalidLandmarks("no landmarks loaded".to_string()))?;

        let residual1 = colinearity_residual(x1);
        let residual2 = colinearity_residual(x2);
        let colinear = AlignError::Colinear {
            residual1,
            residual2,
            threshold: self.colinear_threshold,
        };

        // differences relative to the first landmark
        let (dx1, dy1) = (x1[1][0] - x1[0][0], x1[1][1] - x1[0][1]);
        let (dx2, dy2) = (x1[2][0] - x1[0][0], x1[2][1] - x1[0][1]);
        let (tx1, ty1) = (x2[1][0] - x2[0][0], x2[1][1] - x2[0][1]);
        let (tx2, ty2) = (x2[2][0] - x2[0][0], x2[2][1] - x2[0][1]);

        let det = dx1 * dy2 - dx2 * dy1;
        let det_to = tx1 * ty2 - tx2 * ty1;
        if det == 0.0 || det_to == 0.0 {
            return Err(colinear);
        }
        if residual1 < self.colinear_threshold || residual2 < self.colinear_threshold {
            log::debug!("colinear landmarks: residuals {residual1:.3}, {residual2:.3}");
            return Err(colinear);
        }

        let a = (tx1 * dy2 - tx2 * dy1) / det;
        let b = (dx1 * tx2 - dx2 * tx1) / det;
        let c = x2[0][0] - a * x1[0][0] - b * x1[0][1];
        let d = (ty1 * dy2 - ty2 * dy1) / det;
        let e = (dx1 * ty2 - dx2 * ty1) / det;
        let f = x2[0][1] - d * x1[0][0] - e * x1[0][1];

        let det2 = a * e - b * d;
        if det2 == 0.0 {
            return Err(AlignError::SingularMatrix);
        }
        let (a0, b0) = (e / det2, -b / det2);
        let (d0, e0) = (-d / det2, a / det2);
        let c0 = -(a0 * c + b0 * f);
        let f0 = -(d0 * c + e0 * f);

        log::debug!(
            "affine solved: [{a:.4}, {b:.4}, {c:.2}, {d:.4}, {e:.4}, {f:.2}], \
             residuals {residual1:.3}, {residual2:.3}"
        );

        Ok(AffineModel {
            forward: [a, b, c, d, e, f],
            inverse: [a0, b0, c0, d0, e0, f0],
            residual1,
            residual2,
            status: format!("solved, residuals {residual1:.2} / {residual2:.2}"),
            width: self.width,
            height: self.height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::Landmark;
    use approx::assert_relative_eq;
    use rand::Rng;

    fn make_table(from: [Point2; 3], to: [Point2; 3]) -> LandmarkTable {
        LandmarkTable::new(
            from.iter()
                .zip(to.iter())
                .map(|(&p, &q)| Landmark::new(p, q))
                .collect(),
        )
    }

    #[test]
    fn translation() -> Result<(), AlignError> {
        let table = make_table(
            [[10.0, 10.0], [50.0, 10.0], [10.0, 50.0]],
            [[20.0, 20.0], [60.0, 20.0], [20.0, 60.0]],
        );
        let mut solver = AffineSolver::new(1.0, 100, 100);
        solver.set_landmarks(&table, [0, 1, 2], false)?;
        let model = solver.solve()?;

        let expected = [1.0, 0.0, 10.0, 0.0, 1.0, 10.0];
        for (v, e) in model.forward.iter().zip(expected.iter()) {
            assert_relative_eq!(*v, *e, epsilon = 1e-9);
        }
        let expected = [1.0, 0.0, -10.0, 0.0, 1.0, -10.0];
        for (v, e) in model.inverse.iter().zip(expected.iter()) {
            assert_relative_eq!(*v, *e, epsilon = 1e-9);
        }
        assert!(model.residual1 > 10.0 && model.residual2 > 10.0);
        Ok(())
    }

    #[test]
    fn flip_swaps_direction() -> Result<(), AlignError> {
        let table = make_table(
            [[10.0, 10.0], [50.0, 10.0], [10.0, 50.0]],
            [[20.0, 20.0], [60.0, 20.0], [20.0, 60.0]],
        );
        let mut solver = AffineSolver::new(1.0, 100, 100);
        solver.set_landmarks(&table, [0, 1, 2], true)?;
        let model = solver.solve()?;
        assert_relative_eq!(model.forward[2], -10.0, epsilon = 1e-9);
        assert_relative_eq!(model.forward[5], -10.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn nearly_colinear() -> Result<(), AlignError> {
        // nearly horizontal in the first image
        let table = make_table(
            [[0.0, 0.0], [20.0, 0.5], [40.0, 0.2]],
            [[5.0, 0.0], [40.0, 7.0], [3.0, 70.0]],
        );
        let mut solver = AffineSolver::new(1.0, 100, 100);
        solver.set_landmarks(&table, [0, 1, 2], false)?;
        match solver.solve() {
            Err(AlignError::Colinear { residual1, .. }) => assert!(residual1 < 1.0),
            other => panic!("expected a colinear error, got {other:?}"),
        }

        // exactly on a diagonal in the second image
        let table = make_table(
            [[10.0, 10.0], [50.0, 10.0], [10.0, 50.0]],
            [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]],
        );
        solver.set_landmarks(&table, [0, 1, 2], false)?;
        assert!(matches!(solver.solve(), Err(AlignError::Colinear { .. })));
        Ok(())
    }

    #[test]
    fn residual_uses_axis_variance() -> Result<(), AlignError> {
        // close to the diagonal, but spread along both axes
        let from = [[0.0, 0.0], [40.0, 41.5], [80.0, 80.0]];
        let expected = (3200.0f64 / 3.0).sqrt();
        assert_relative_eq!(colinearity_residual(&from), expected, epsilon = 1e-9);

        let table = make_table(from, [[5.0, 0.0], [40.0, 7.0], [3.0, 70.0]]);
        let mut solver = AffineSolver::new(1.0, 100, 100);
        solver.set_landmarks(&table, [0, 1, 2], false)?;
        let model = solver.solve()?;
        assert!(model.residual1 > 30.0);
        Ok(())
    }

    #[test]
    fn invalid_indices() {
        let table = make_table(
            [[10.0, 10.0], [50.0, 10.0], [10.0, 50.0]],
            [[20.0, 20.0], [60.0, 20.0], [20.0, 60.0]],
        );
        let mut solver = AffineSolver::new(1.0, 100, 100);
        assert!(matches!(
            solver.set_landmarks(&table, [0, 1, 3], false),
            Err(AlignError::InvalidLandmarks(_))
        ));
        assert!(matches!(
            solver.set_landmarks(&table, [0, 1, 1], false),
            Err(AlignError::InvalidLandmarks(_))
        ));
        assert!(matches!(solver.solve(), Err(AlignError::InvalidLandmarks(_))));

        let short = LandmarkTable::new(vec![Landmark::new([0.0, 0.0], [0.0, 0.0])]);
        assert!(matches!(
            solver.set_landmarks(&short, [0, 1, 2], false),
            Err(AlignError::InvalidLandmarks(_))
        ));
    }

    #[test]
    fn mapping_is_clamped() {
        let model = AffineModel::identity(10, 5);
        assert_eq!(model.map_forward(-3.0, 7.0), (0.0, 4.0));
        assert_eq!(model.map_inverse(2.5, 1.0), (2.5, 1.0));
    }

    #[test]
    fn random_round_trip() -> Result<(), AlignError> {
        let mut rng = rand::rng();
        let from = [[20.0, 20.0], [180.0, 30.0], [40.0, 170.0]];

        for _ in 0..50 {
            let theta: f64 = rng.random_range(-0.3..0.3);
            let scale: f64 = rng.random_range(0.8..1.2);
            let tx: f64 = rng.random_range(-15.0..15.0);
            let ty: f64 = rng.random_range(-15.0..15.0);
            let (s, c) = theta.sin_cos();
            let warp = |p: Point2| {
                [
                    scale * (c * p[0] - s * p[1]) + tx,
                    scale * (s * p[0] + c * p[1]) + ty,
                ]
            };

            let to = [warp(from[0]), warp(from[1]), warp(from[2])];
            let mut solver = AffineSolver::new(1.0, 200, 200);
            solver.set_landmarks(&make_table(from, to), [0, 1, 2], false)?;
            let model = solver.solve()?;

            for _ in 0..20 {
                let (x, y) = (rng.random_range(1.0..199.0), rng.random_range(1.0..199.0));
                let (u, v) = model.map_forward(x, y);
                if u <= 0.0 || v <= 0.0 || u >= 199.0 || v >= 199.0 {
                    continue;
                }
                let (xr, yr) = model.map_inverse(u.round(), v.round());
                assert!((xr - x).abs() < 1.5 && (yr - y).abs() < 1.5);
            }
        }
        Ok(())
    }
}
