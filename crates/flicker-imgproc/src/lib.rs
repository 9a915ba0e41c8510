#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// color conversions and pseudocolor.
pub mod color;

/// image cropping module.
pub mod crop;

/// point enhancement transforms.
pub mod enhance;

/// 3x3 neighborhood filters.
pub mod filter;

/// image flipping module.
pub mod flip;

/// guard region border handling.
pub mod guard;

/// compute image histogram module.
pub mod histogram;

/// 3x3 neighborhood sampling.
pub mod neighborhood;

/// module containing parallelization utilities.
pub mod parallel;

/// zoom resampling.
pub mod resize;

/// operations to threshold images.
pub mod threshold;

/// image geometric transformations module.
pub mod warp;
