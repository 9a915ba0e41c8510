//! Packed `0xAARRGGBB` rasters as exchanged with the image model and display layers.
//!
//! Gray rasters store the same 8-bit value in the red, green and blue bytes, so the
//! gray view of a packed pixel is its low (blue) byte.

use crate::{Image, ImageError};

/// A displayable raster of packed 32-bit ARGB pixels.
pub type Raster = Image<u32, 1>;

/// An 8-bit single channel view of a raster.
pub type GrayImage = Image<u8, 1>;

/// Opaque white.
pub const WHITE: u32 = 0xFFFF_FFFF;

/// Opaque black.
pub const BLACK: u32 = 0xFF00_0000;

const OPAQUE: u32 = 0xFF00_0000;

/// Pack opaque red, green and blue bytes into one pixel.
#[inline]
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    OPAQUE | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Split a packed pixel into its red, green and blue bytes.
#[inline]
pub fn unpack_rgb(pixel: u32) -> (u8, u8, u8) {
    (
        ((pixel >> 16) & 0xFF) as u8,
        ((pixel >> 8) & 0xFF) as u8,
        (pixel & 0xFF) as u8,
    )
}

/// The 8-bit gray value of a packed pixel (its low byte).
#[inline]
pub fn gray_of(pixel: u32) -> u8 {
    (pixel & 0xFF) as u8
}

/// Broadcast a gray value into an opaque RGB pixel.
#[inline]
pub fn pack_gray(g: u8) -> u32 {
    pack_rgb(g, g, g)
}

/// Extract the gray view of a raster.
///
/// # Example
///
/// ```
/// use flicker_image::packed::{gray_from_raster, pack_gray};
/// use flicker_image::Raster;
///
/// let raster = Raster::new([2, 1].into(), vec![pack_gray(3), pack_gray(200)]).unwrap();
/// let gray = gray_from_raster(&raster).unwrap();
/// assert_eq!(gray.as_slice(), &[3u8, 200]);
/// ```
pub fn gray_from_raster(src: &Raster) -> Result<GrayImage, ImageError> {
    let data = src.as_slice().iter().map(|&p| gray_of(p)).collect();
    GrayImage::new(src.size(), data)
}

/// Write a gray image into the RGB channels of `dst`.
///
/// PRECONDITION: `src` and `dst` must have the same size.
pub fn broadcast_gray(src: &GrayImage, dst: &mut Raster) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    dst.as_slice_mut()
        .iter_mut()
        .zip(src.as_slice().iter())
        .for_each(|(d, &g)| *d = pack_gray(g));

    Ok(())
}
