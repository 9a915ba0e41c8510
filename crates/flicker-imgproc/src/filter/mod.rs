//! Filter operations
//!
//! 3x3 neighborhood filters over 8-bit gray images. Every filter reads a
//! source image and writes a distinct destination of the same size, clamping
//! its result to `[0, 255]`.

/// Filter kernels
pub mod kernels;

/// Filter operations
mod ops;
pub use ops::*;
