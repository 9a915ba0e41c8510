use flicker_align::AlignError;
use flicker_image::ImageError;

use crate::op::ImageSide;

/// An error type for the transform engine.
///
/// Every variant aborts a single invocation only; the other side and the
/// displayed rasters are left untouched.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum TransformError {
    /// The selected landmarks are out of range, repeated, invalid or too few.
    #[error("Invalid landmarks: {0}")]
    InvalidLandmarks(String),

    /// The affine landmark triple is (nearly) colinear.
    #[error("Colinear landmarks (residuals {residual1:.3}/{residual2:.3}, limit {threshold:.3})")]
    Colinear {
        /// Residual in the first image.
        residual1: f64,
        /// Residual in the second image.
        residual2: f64,
        /// The configured threshold.
        threshold: f64,
    },

    /// The affine matrix cannot be inverted.
    #[error("Singular affine matrix")]
    SingularMatrix,

    /// Not enough landmarks for a polynomial warp.
    #[error("Insufficient landmarks: {needed} required, {got} available")]
    InsufficientLandmarks {
        /// Number of landmarks the model needs.
        needed: usize,
        /// Number of valid landmarks given.
        got: usize,
    },

    /// The spatial solver failed.
    #[error("Spatial solve failed: {0}")]
    SolveFailed(String),

    /// The output buffer could not be allocated.
    #[error("Out of memory allocating {pixels} pixels for the {side} image")]
    OutOfMemory {
        /// The side being transformed.
        side: ImageSide,
        /// Requested number of pixels.
        pixels: usize,
    },

    /// The operation name is not a built-in and no plugin is registered under it.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// A parameter is out of its valid range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// An invocation is already in flight on this side.
    #[error("A transform is already running on the {0} image")]
    SideBusy(ImageSide),

    /// The image model has no raster for this side.
    #[error("No image loaded on the {0} side")]
    NoImage(ImageSide),

    /// The worker thread panicked.
    #[error("Transform worker panicked")]
    WorkerPanicked,

    /// The engine configuration could not be read.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// An error from the image layer.
    #[error(transparent)]
    Image(#[from] ImageError),
}

impl From<AlignError> for TransformError {
    fn from(err: AlignError) -> Self {
        match err {
            AlignError::InvalidLandmarks(msg) => TransformError::InvalidLandmarks(msg),
            AlignError::Colinear {
                residual1,
                residual2,
                threshold,
            } => TransformError::Colinear {
                residual1,
                residual2,
                threshold,
            },
            AlignError::SingularMatrix => TransformError::SingularMatrix,
            AlignError::InsufficientLandmarks { needed, got } => {
                TransformError::InsufficientLandmarks { needed, got }
            }
            AlignError::SolveFailed(msg) => TransformError::SolveFailed(msg),
        }
    }
}
