use faer::prelude::SpSolverLstsq;
use serde::{Deserialize, Serialize};

use crate::error::AlignError;
use crate::landmark::Point2;

/// Number of terms of the second order bivariate polynomial.
pub const POLY_TERMS: usize = 6;

/// A pair of second order polynomials `u(x, y)`, `v(x, y)`.
///
/// Inputs are normalized as `xn = (x - origin_x) / scale` before evaluating
/// `c0 + c1 xn + c2 yn + c3 xn^2 + c4 xn yn + c5 yn^2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialModel {
    /// Coefficients of the x polynomial.
    pub u: [f64; POLY_TERMS],
    /// Coefficients of the y polynomial.
    pub v: [f64; POLY_TERMS],
    /// Normalization origin.
    pub origin: Point2,
    /// Normalization scale.
    pub scale: f64,
}

fn basis(x: f64, y: f64) -> [f64; POLY_TERMS] {
    [1.0, x, y, x * x, x * y, y * y]
}

impl PolynomialModel {
    /// The identity map.
    pub fn identity() -> Self {
        Self {
            u: [0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
            v: [0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
            origin: [0.0, 0.0],
            scale: 1.0,
        }
    }

    /// Evaluate the map at `(x, y)`.
    pub fn map(&self, x: f64, y: f64) -> (f64, f64) {
        let xn = (x - self.origin[0]) / self.scale;
        let yn = (y - self.origin[1]) / self.scale;
        let terms = basis(xn, yn);
        let eval = |coeffs: &[f64; POLY_TERMS]| -> f64 {
            coeffs.iter().zip(terms.iter()).map(|(c, t)| c * t).sum()
        };
        (eval(&self.u), eval(&self.v))
    }
}

/// Fits a point mapping through landmark correspondences.
pub trait SpatialSolver: Send + Sync {
    /// Smallest number of correspondences the solver accepts.
    fn min_landmarks(&self) -> usize;

    /// Fit a model mapping every `from[i]` close to `to[i]`.
    fn solve(&self, from: &[Point2], to: &[Point2]) -> Result<PolynomialModel, AlignError>;
}

/// Least squares fit of the second order polynomial model using a QR decomposition.
///
/// # Example
///
/// ```
/// use flicker_align::{LeastSquaresSolver, SpatialSolver};
///
/// let from: Vec<[f64; 2]> = (0..9)
///     .map(|i| [(i % 3) as f64 * 10.0, (i / 3) as f64 * 10.0])
///     .collect();
/// let to: Vec<[f64; 2]> = from.iter().map(|p| [p[0] + 5.0, p[1] - 2.0]).collect();
///
/// let model = LeastSquaresSolver.solve(&from, &to).unwrap();
/// let (x, y) = model.map(7.0, 3.0);
/// assert!((x - 12.0).abs() < 1e-6 && (y - 1.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LeastSquaresSolver;

impl SpatialSolver for LeastSquaresSolver {
    fn min_landmarks(&self) -> usize {
        POLY_TERMS
    }

    fn solve(&self, from: &[Point2], to: &[Point2]) -> Result<PolynomialModel, AlignError> {
        if from.len() != to.len() {
            return Err(AlignError::InvalidLandmarks(format!(
                "{} source points but {} target points",
                from.len(),
                to.len()
            )));
        }
        let n = from.len();
        if n < POLY_TERMS {
            return Err(AlignError::InsufficientLandmarks {
                needed: POLY_TERMS,
                got: n,
            });
        }

        let origin = [
            from.iter().map(|p| p[0]).sum::<f64>() / n as f64,
            from.iter().map(|p| p[1]).sum::<f64>() / n as f64,
        ];
        let scale = from
            .iter()
            .map(|p| (p[0] - origin[0]).abs().max((p[1] - origin[1]).abs()))
            .fold(0.0, f64::max);
        if scale == 0.0 || !scale.is_finite() {
            return Err(AlignError::SolveFailed(
                "landmarks do not span an area".to_string(),
            ));
        }

        // construct the design matrix and the two right hand sides
        let mut mat_a = faer::Mat::<f64>::zeros(n, POLY_TERMS);
        let mut mat_b = faer::Mat::<f64>::zeros(n, 2);
        for (i, (p, q)) in from.iter().zip(to.iter()).enumerate() {
            let terms = basis((p[0] - origin[0]) / scale, (p[1] - origin[1]) / scale);
            for (j, t) in terms.iter().enumerate() {
                mat_a.write(i, j, *t);
            }
            mat_b.write(i, 0, q[0]);
            mat_b.write(i, 1, q[1]);
        }

        let params = mat_a.qr().solve_lstsq(mat_b);
        let (col_u, col_v) = (params.col(0), params.col(1));

        let mut u = [0.0; POLY_TERMS];
        let mut v = [0.0; POLY_TERMS];
        for (k, (uk, vk)) in u.iter_mut().zip(v.iter_mut()).enumerate() {
            *uk = col_u[k];
            *vk = col_v[k];
        }

        if u.iter().chain(v.iter()).any(|c| !c.is_finite()) {
            return Err(AlignError::SolveFailed(
                "least squares produced non-finite coefficients".to_string(),
            ));
        }

        let model = PolynomialModel {
            u,
            v,
            origin,
            scale,
        };

        let rms = (from
            .iter()
            .zip(to.iter())
            .map(|(p, q)| {
                let (x, y) = model.map(p[0], p[1]);
                (x - q[0]).powi(2) + (y - q[1]).powi(2)
            })
            .sum::<f64>()
            / n as f64)
            .sqrt();
        if !rms.is_finite() {
            return Err(AlignError::SolveFailed("residual is not finite".to_string()));
        }
        log::debug!("polynomial fit over {n} landmarks, rms residual {rms:.3}");

        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid() -> Vec<Point2> {
        (0..16)
            .map(|i| [(i % 4) as f64 * 30.0 + 5.0, (i / 4) as f64 * 25.0 + 10.0])
            .collect()
    }

    #[test]
    fn recovers_quadratic() -> Result<(), AlignError> {
        let f = |x: f64, y: f64| {
            (
                3.0 + 1.1 * x - 0.2 * y + 0.001 * x * x,
                -4.0 + 0.1 * x + 0.9 * y + 0.002 * x * y,
            )
        };
        let from = grid();
        let to: Vec<Point2> = from
            .iter()
            .map(|p| {
                let (u, v) = f(p[0], p[1]);
                [u, v]
            })
            .collect();

        let model = LeastSquaresSolver.solve(&from, &to)?;
        for (x, y) in [(12.0, 40.0), (60.0, 70.0), (90.0, 15.0)] {
            let (u, v) = model.map(x, y);
            let (eu, ev) = f(x, y);
            assert_relative_eq!(u, eu, epsilon = 1e-6);
            assert_relative_eq!(v, ev, epsilon = 1e-6);
        }
        Ok(())
    }

    #[test]
    fn insufficient() {
        let from = vec![[0.0, 0.0]; 5];
        assert_eq!(
            LeastSquaresSolver.solve(&from, &from),
            Err(AlignError::InsufficientLandmarks { needed: 6, got: 5 })
        );
    }

    #[test]
    fn degenerate() {
        let from = vec![[3.0, 3.0]; 8];
        assert!(matches!(
            LeastSquaresSolver.solve(&from, &from),
            Err(AlignError::SolveFailed(_))
        ));
    }

    #[test]
    fn identity_model() {
        assert_eq!(PolynomialModel::identity().map(4.0, -2.0), (4.0, -2.0));
    }
}
