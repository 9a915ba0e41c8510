/// An error type for the alignment solvers.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum AlignError {
    /// The selected landmarks are out of range, repeated, invalid or too few.
    #[error("Invalid landmarks: {0}")]
    InvalidLandmarks(String),

    /// The landmark triple is (nearly) on a line in one of the images.
    #[error("Colinear landmarks (residuals {residual1:.3}/{residual2:.3}, limit {threshold:.3})")]
    Colinear {
        /// Colinearity residual of the points in the first image.
        residual1: f64,
        /// Colinearity residual of the points in the second image.
        residual2: f64,
        /// The configured threshold.
        threshold: f64,
    },

    /// The linear part of the affine map cannot be inverted.
    #[error("Singular affine matrix")]
    SingularMatrix,

    /// Not enough landmarks for the requested model.
    #[error("Insufficient landmarks: {needed} required, {got} available")]
    InsufficientLandmarks {
        /// Number of landmarks the model needs.
        needed: usize,
        /// Number of valid landmarks given.
        got: usize,
    },

    /// The least squares solve did not produce a usable model.
    #[error("Spatial solve failed: {0}")]
    SolveFailed(String),
}
