/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when the data length does not match the image size.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when two images that must agree in size do not.
    #[error("Image size mismatch: {0}x{1} vs {2}x{3}")]
    InvalidImageSize(usize, usize, usize, usize),

    /// Error when a pixel index is out of bounds.
    #[error("Pixel index ({0}, {1}) is out of bounds ({2}x{3})")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),

    /// Error when the image has a zero dimension where pixels are required.
    #[error("Image must not be empty, got {0}x{1}")]
    EmptyImage(usize, usize),

    /// Error when the backing buffer cannot be allocated.
    #[error("Failed to allocate {0} pixels")]
    AllocationFailed(usize),

    /// Error when the resampling backend rejects the buffers.
    #[error("Resampling failed: {0}")]
    ResampleError(String),
}
