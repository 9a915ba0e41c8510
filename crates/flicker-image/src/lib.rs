#![deny(missing_docs)]
//! Image types and helpers for the packed 32-bit rasters exchanged with the display layer.

/// image representation for raster processing.
pub mod image;

/// Error types for the image module.
pub mod error;

/// Packed ARGB raster helpers.
pub mod packed;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageSize};
pub use crate::packed::{GrayImage, Raster, BLACK, WHITE};
