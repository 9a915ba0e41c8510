//! Routing of one side of an invocation to the filter, radiometric, warp and
//! zoom implementations.

use flicker_align::LandmarkOverlaySet;
use flicker_image::{
    packed::{broadcast_gray, gray_from_raster},
    GrayImage, ImageError, ImageSize, Raster,
};
use flicker_imgproc::{
    color, enhance, filter, flip,
    guard::{resample_with_guard, GuardRegion},
    resize::{resample, zoom_size},
    threshold::threshold_slice,
};

use crate::context::SessionContext;
use crate::error::TransformError;
use crate::model::SourceImage;
use crate::op::{ImageSide, TransformOp};
use crate::session::TransformParams;
use crate::warp_engine::GeometricWarpEngine;

/// Everything one side needs, snapshotted before the work starts.
pub(crate) struct SideInput {
    pub side: ImageSide,
    pub source: SourceImage,
    pub original: Option<Raster>,
    pub overlay: LandmarkOverlaySet,
    pub guard: Option<GuardRegion>,
}

/// The finished output of one side, not yet visible to the display.
pub(crate) struct SideOutput {
    pub raster: Raster,
    pub overlay: LandmarkOverlaySet,
    pub guard: Option<GuardRegion>,
}

/// Target sizes of a zoom: the new interior, the new guard and the full raster.
struct ZoomPlan {
    interior: ImageSize,
    old_interior: ImageSize,
    old_guard: Option<GuardRegion>,
    new_guard: Option<GuardRegion>,
    size: ImageSize,
}

fn plan_zoom(
    src: ImageSize,
    guard: Option<GuardRegion>,
    ctx: &SessionContext,
    mag: f64,
) -> ZoomPlan {
    let policy = ctx.config.zoom_policy();
    let guarded = guard.and_then(|g| {
        g.interior_size(src)
            .filter(|interior| interior.area() > 0)
            .map(|interior| (g, interior))
    });

    match guarded {
        Some((g, old_interior)) => {
            let interior = zoom_size(old_interior, mag, &policy);
            let new_guard = g.scaled(interior.width as f64 / old_interior.width as f64);
            ZoomPlan {
                interior,
                old_interior,
                old_guard: Some(g),
                new_guard: Some(new_guard),
                size: new_guard.padded_size(interior),
            }
        }
        None => {
            let interior = zoom_size(src, mag, &policy);
            ZoomPlan {
                interior,
                old_interior: src,
                old_guard: None,
                new_guard: None,
                size: interior,
            }
        }
    }
}

fn output_size(
    ctx: &SessionContext,
    op: TransformOp,
    params: &TransformParams,
    input: &SideInput,
) -> Result<ImageSize, TransformError> {
    match op {
        TransformOp::DeZoom => {
            Ok(plan_zoom(input.source.raster.size(), input.guard, ctx, params.zoom_mag).size)
        }
        TransformOp::NormColor => input
            .original
            .as_ref()
            .map(Raster::size)
            .ok_or(TransformError::NoImage(input.side)),
        _ => Ok(input.source.raster.size()),
    }
}

/// Run a gray-domain operation on the low byte of a raster and broadcast the result.
fn gray_op<F>(src: &Raster, dst: &mut Raster, f: F) -> Result<(), TransformError>
where
    F: FnOnce(&GrayImage, &mut GrayImage) -> Result<(), ImageError>,
{
    let gray = gray_from_raster(src)?;
    let mut out = GrayImage::try_from_size_val(gray.size(), 0)?;
    f(&gray, &mut out)?;
    broadcast_gray(&out, dst)?;
    Ok(())
}

fn copy_into(src: &Raster, dst: &mut Raster) -> Result<(), TransformError> {
    if src.size() != dst.size() {
        let err = ImageError::InvalidImageSize(src.cols(), src.rows(), dst.cols(), dst.rows());
        return Err(err.into());
    }
    dst.as_slice_mut().copy_from_slice(src.as_slice());
    Ok(())
}

/// Compute the output of `op` for one side.
///
/// The output buffer is allocated before any pixel is written; allocation
/// failures surface as [`TransformError::OutOfMemory`].
pub(crate) fn run_side(
    ctx: &SessionContext,
    op: TransformOp,
    params: &TransformParams,
    input: SideInput,
) -> Result<SideOutput, TransformError> {
    let side = input.side;
    run_side_inner(ctx, op, params, input).map_err(|err| match err {
        TransformError::Image(ImageError::AllocationFailed(pixels)) => {
            TransformError::OutOfMemory { side, pixels }
        }
        err => err,
    })
}

fn run_side_inner(
    ctx: &SessionContext,
    op: TransformOp,
    params: &TransformParams,
    input: SideInput,
) -> Result<SideOutput, TransformError> {
    let size = output_size(ctx, op, params, &input)?;
    let mut dst = Raster::try_from_size_val(size, 0)?;

    let SideInput {
        side,
        source,
        original,
        mut overlay,
        mut guard,
    } = input;
    let src = &source.raster;
    let e_scale = params.e_scale;

    match op {
        TransformOp::SharpenGrad => {
            gray_op(src, &mut dst, |s, d| filter::sharpen_gradient(s, d, e_scale))?
        }
        TransformOp::SharpenLapl => {
            gray_op(src, &mut dst, |s, d| filter::sharpen_laplacian(s, d, e_scale))?
        }
        TransformOp::Gradient => gray_op(src, &mut dst, filter::gradient)?,
        TransformOp::Laplacian => gray_op(src, &mut dst, filter::laplacian)?,
        TransformOp::Average => gray_op(src, &mut dst, filter::average)?,
        TransformOp::Median => gray_op(src, &mut dst, filter::median)?,
        TransformOp::Max3x3 => gray_op(src, &mut dst, filter::max3x3)?,
        TransformOp::Min3x3 => gray_op(src, &mut dst, filter::min3x3)?,
        TransformOp::Complement => gray_op(src, &mut dst, enhance::complement)?,
        TransformOp::ContrastEnhance => gray_op(src, &mut dst, enhance::contrast_stretch)?,
        TransformOp::HistEqualize => gray_op(src, &mut dst, enhance::equalize_histogram)?,
        TransformOp::Threshold => gray_op(src, &mut dst, |s, d| {
            threshold_slice(
                s,
                d,
                params.threshold1,
                params.threshold2,
                params.slice_mode,
                source.black_is_zero,
            )
        })?,
        TransformOp::PseudoColor => {
            let gray = gray_from_raster(src)?;
            color::pseudocolor(&gray, &mut dst)?;
        }
        TransformOp::Color2Gray => {
            let mut gray = GrayImage::try_from_size_val(src.size(), 0)?;
            color::gray_from_rgb_packed(src, &mut gray, ctx.config.gray_weights)?;
            broadcast_gray(&gray, &mut dst)?;
        }
        TransformOp::NormColor => {
            let original = original.ok_or(TransformError::NoImage(side))?;
            copy_into(&original, &mut dst)?;
            overlay.reset();
            guard = ctx.config.guard;
        }
        TransformOp::FlipHoriz => {
            flip::horizontal_flip(src, &mut dst)?;
            let max_x = src.width().saturating_sub(1) as f64;
            overlay = overlay.remapped(|[x, y]| [max_x - x, y]);
        }
        TransformOp::FlipVert => {
            flip::vertical_flip(src, &mut dst)?;
            let max_y = src.height().saturating_sub(1) as f64;
            overlay = overlay.remapped(|[x, y]| [x, max_y - y]);
        }
        TransformOp::DeZoom => {
            let plan = plan_zoom(src.size(), guard, ctx, params.zoom_mag);
            let mode = ctx.config.resample_mode;
            match plan.old_guard {
                Some(g) => {
                    let (zoomed, _) = resample_with_guard(src, &g, plan.interior, mode)?;
                    copy_into(&zoomed, &mut dst)?;
                }
                None => resample(src, &mut dst, mode)?,
            }

            let sx = plan.interior.width as f64 / plan.old_interior.width as f64;
            let sy = plan.interior.height as f64 / plan.old_interior.height as f64;
            let m_old = plan.old_guard.map_or(0.0, |g| g.margin as f64);
            let m_new = plan.new_guard.map_or(0.0, |g| g.margin as f64);
            overlay = overlay
                .remapped(|[x, y]| [(x - m_old) * sx + m_new, (y - m_old) * sy + m_new]);
            guard = plan.new_guard;
        }
        TransformOp::AffineWarp | TransformOp::PolyWarp | TransformOp::Pseudo3D => {
            let mut engine = GeometricWarpEngine::default();
            overlay = engine.solve_and_run(ctx, side, op, params, src, &mut dst, &overlay)?;
        }
        TransformOp::Plugin(slot) => {
            let plugin = ctx
                .plugins
                .get(slot)
                .ok_or_else(|| TransformError::UnknownOperation(op.to_string()))?;
            log::debug!("{side}: running plugin `{}`", plugin.name());
            plugin.apply(src, &mut dst, params)?;
        }
    }

    Ok(SideOutput {
        raster: dst,
        overlay,
        guard,
    })
}
