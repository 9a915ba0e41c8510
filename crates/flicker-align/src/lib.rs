#![deny(missing_docs)]
//! Landmark correspondences between two images and the solvers that turn them
//! into point mappings.

/// Error types for the alignment solvers.
pub mod error;

/// Landmark table and overlay coordinates.
pub mod landmark;

/// Three-landmark affine solver.
pub mod affine;

/// Second order polynomial spatial solver.
pub mod polynomial;

pub use crate::affine::{colinearity_residual, AffineModel, AffineSolver};
pub use crate::error::AlignError;
pub use crate::landmark::{Landmark, LandmarkOverlaySet, LandmarkTable, Point2};
pub use crate::polynomial::{LeastSquaresSolver, PolynomialModel, SpatialSolver};
