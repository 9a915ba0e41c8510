use flicker_image::{packed::gray_of, ImageError, ImageSize, Raster, WHITE};
use serde::{Deserialize, Serialize};

/// Oblique projection that lifts each pixel by its gray value.
///
/// A source pixel `(x, y)` with gray `g` lands at
///
/// ```text
/// x' = x + width * sin(angle) * (height - y) / height
/// y' = y - z_scale * g / 100
/// ```
///
/// so the top rows shear the most and bright pixels rise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pseudo3dProjection {
    /// Shear angle in degrees.
    pub angle_deg: f64,
    /// Vertical lift in percent of the gray value.
    pub z_scale: u8,
}

impl Pseudo3dProjection {
    /// Project a point with gray value `gray` inside an image of size `size`.
    pub fn project(&self, x: f64, y: f64, gray: u8, size: ImageSize) -> (f64, f64) {
        let (w, h) = (size.width as f64, size.height as f64);
        let shear = if h > 0.0 {
            w * self.angle_deg.to_radians().sin() * (h - y) / h
        } else {
            0.0
        };
        let lift = self.z_scale.min(100) as f64 * gray as f64 / 100.0;
        (x + shear, y - lift)
    }
}

/// Forward-map `src` through a pseudo-3D projection.
///
/// The destination starts white; source pixels are written in raster order,
/// those landing outside the image are dropped and later writes overwrite
/// earlier ones. Unreached destination pixels stay white.
///
/// # Errors
///
/// Returns an error if `src` and `dst` differ in size.
pub fn warp_pseudo3d(
    src: &Raster,
    dst: &mut Raster,
    projection: &Pseudo3dProjection,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    let size = src.size();
    let (cols, rows) = (size.width as f64, size.height as f64);
    let out = dst.as_slice_mut();
    out.fill(WHITE);

    for (i, &pixel) in src.as_slice().iter().enumerate() {
        let (x, y) = (i % size.width, i / size.width);
        let (xd, yd) = projection.project(x as f64, y as f64, gray_of(pixel), size);
        let (xd, yd) = (xd.round(), yd.round());
        if !(0.0..cols).contains(&xd) || !(0.0..rows).contains(&yd) {
            continue;
        }
        out[yd as usize * size.width + xd as usize] = pixel;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flicker_image::packed::pack_gray;

    #[test]
    fn flat_projection_is_identity() -> Result<(), ImageError> {
        let src = Raster::new([3, 2].into(), (0..6).map(|v| pack_gray(v * 40)).collect())?;
        let mut dst = Raster::from_size_val(src.size(), 0)?;
        let projection = Pseudo3dProjection {
            angle_deg: 0.0,
            z_scale: 0,
        };
        warp_pseudo3d(&src, &mut dst, &projection)?;
        assert_eq!(dst, src);
        Ok(())
    }

    #[test]
    fn lift_leaves_white_holes() -> Result<(), ImageError> {
        // one bright pixel on a black background, lifted by one row
        let mut src = Raster::from_size_val([2, 3].into(), pack_gray(0))?;
        src.set_pixel(0, 2, 0, pack_gray(200))?;
        let mut dst = Raster::from_size_val(src.size(), 0)?;
        let projection = Pseudo3dProjection {
            angle_deg: 0.0,
            z_scale: 1,
        };
        warp_pseudo3d(&src, &mut dst, &projection)?;

        // 1 * 200 / 100 = 2 rows up, overwriting the black pixel there
        assert_eq!(dst.get_pixel(0, 0, 0)?, pack_gray(200));
        assert_eq!(dst.get_pixel(0, 2, 0)?, WHITE);
        assert_eq!(dst.get_pixel(1, 2, 0)?, pack_gray(0));
        Ok(())
    }

    #[test]
    fn shear_drops_pixels() -> Result<(), ImageError> {
        let src = Raster::from_size_val([4, 2].into(), pack_gray(0))?;
        let mut dst = Raster::from_size_val(src.size(), 0)?;
        let projection = Pseudo3dProjection {
            angle_deg: 90.0,
            z_scale: 0,
        };
        warp_pseudo3d(&src, &mut dst, &projection)?;
        // row 0 shifts by 4 and leaves entirely; row 1 shifts by 2
        assert_eq!(dst.get_pixel(0, 0, 0)?, WHITE);
        assert_eq!(dst.get_pixel(1, 1, 0)?, WHITE);
        assert_eq!(dst.get_pixel(2, 1, 0)?, pack_gray(0));
        Ok(())
    }
}
