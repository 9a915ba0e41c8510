use flicker_align::{AffineModel, AffineSolver, LandmarkOverlaySet, Point2, PolynomialModel};
use flicker_image::{packed::gray_of, ImageSize, Raster};
use flicker_imgproc::warp::{warp_pseudo3d, warp_reverse, PointMap, Pseudo3dProjection};

use crate::context::SessionContext;
use crate::error::TransformError;
use crate::op::{ImageSide, TransformOp};
use crate::session::TransformParams;

/// Progress of a geometric warp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarpState {
    /// Not started.
    Idle,
    /// Writing output pixels.
    Mapping,
    /// Recomputing the landmark overlay.
    Remapping,
    /// Finished; the output and overlay are complete.
    Done,
    /// Aborted; the output must be discarded.
    Failed,
}

/// The point mapping a warp applies.
///
/// `Affine` and `Polynomial` are reverse maps from output to source pixels;
/// `Pseudo3d` is a forward projection of source pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum WarpStrategy {
    /// Three-landmark affine map; `forward` reads the source.
    Affine(AffineModel),
    /// Polynomial maps fitted in both directions.
    Polynomial {
        /// Output to source.
        forward: PolynomialModel,
        /// Source to output, used for the overlay.
        inverse: PolynomialModel,
        /// Raster size used for clamping.
        size: ImageSize,
    },
    /// Gray-driven oblique projection.
    Pseudo3d {
        /// The projection.
        projection: Pseudo3dProjection,
        /// Raster size.
        size: ImageSize,
    },
}

fn clamp_point((x, y): (f64, f64), size: ImageSize) -> Point2 {
    let max_x = size.width.saturating_sub(1) as f64;
    let max_y = size.height.saturating_sub(1) as f64;
    [x.clamp(0.0, max_x), y.clamp(0.0, max_y)]
}

impl WarpStrategy {
    /// Solve the strategy for `op` on `side` from the landmarks in `ctx`.
    ///
    /// The right image is solved from image 1 to image 2 and the left image with
    /// the roles flipped, so each side is warped onto the other's frame;
    /// `params.flip_landmarks` inverts that convention.
    pub fn solve(
        ctx: &SessionContext,
        side: ImageSide,
        op: TransformOp,
        params: &TransformParams,
        size: ImageSize,
    ) -> Result<Self, TransformError> {
        let flip = (side == ImageSide::Left) != params.flip_landmarks;

        match op {
            TransformOp::AffineWarp => {
                let mut solver =
                    AffineSolver::new(ctx.config.colinear_threshold, size.width, size.height);
                solver.set_landmarks(ctx.landmarks(), [0, 1, 2], flip)?;
                Ok(WarpStrategy::Affine(solver.solve()?))
            }
            TransformOp::PolyWarp => {
                let solver = ctx.spatial_solver();
                let (from, to) = ctx.landmarks().correspondences(flip);
                if from.len() < solver.min_landmarks() {
                    return Err(TransformError::InsufficientLandmarks {
                        needed: solver.min_landmarks(),
                        got: from.len(),
                    });
                }
                Ok(WarpStrategy::Polynomial {
                    forward: solver.solve(&from, &to)?,
                    inverse: solver.solve(&to, &from)?,
                    size,
                })
            }
            TransformOp::Pseudo3D => Ok(WarpStrategy::Pseudo3d {
                projection: Pseudo3dProjection {
                    angle_deg: params.angle_deg,
                    z_scale: params.z_scale,
                },
                size,
            }),
            other => Err(TransformError::InvalidParameter(format!(
                "{other} is not a warp"
            ))),
        }
    }

    /// Where an overlay point of the source ends up in the output.
    pub fn overlay_point(&self, p: Point2, src: &Raster) -> Point2 {
        match self {
            WarpStrategy::Affine(model) => {
                let (x, y) = model.map_inverse(p[0], p[1]);
                [x, y]
            }
            WarpStrategy::Polynomial { inverse, size, .. } => {
                clamp_point(inverse.map(p[0], p[1]), *size)
            }
            WarpStrategy::Pseudo3d { projection, size } => {
                let [x, y] = clamp_point((p[0].round(), p[1].round()), *size);
                let gray = src
                    .get_pixel(x as usize, y as usize, 0)
                    .map(gray_of)
                    .unwrap_or(0);
                clamp_point(projection.project(p[0], p[1], gray, *size), *size)
            }
        }
    }
}

impl PointMap for WarpStrategy {
    /// The strategy's point function; the pseudo-3D projection is evaluated at gray 0.
    fn map_point(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            WarpStrategy::Affine(model) => model.map_forward(x, y),
            WarpStrategy::Polynomial { forward, .. } => forward.map(x, y),
            WarpStrategy::Pseudo3d { projection, size } => projection.project(x, y, 0, *size),
        }
    }
}

/// Applies a [`WarpStrategy`] to one raster and its landmark overlay.
///
/// # Example
///
/// ```
/// use flicker::{GeometricWarpEngine, WarpState, WarpStrategy};
/// use flicker::align::{AffineModel, LandmarkOverlaySet};
/// use flicker::image::Raster;
///
/// let src = Raster::new([3, 1].into(), vec![1, 2, 3]).unwrap();
/// let mut dst = Raster::from_size_val(src.size(), 0).unwrap();
///
/// let mut engine = GeometricWarpEngine::new(WarpStrategy::Affine(AffineModel::identity(3, 1)));
/// engine.run(&src, &mut dst, &LandmarkOverlaySet::default()).unwrap();
/// assert_eq!(engine.state(), WarpState::Done);
/// assert_eq!(dst, src);
/// ```
#[derive(Debug)]
pub struct GeometricWarpEngine {
    strategy: Option<WarpStrategy>,
    state: WarpState,
}

impl Default for GeometricWarpEngine {
    fn default() -> Self {
        Self {
            strategy: None,
            state: WarpState::Idle,
        }
    }
}

impl GeometricWarpEngine {
    /// An idle engine for an already solved `strategy`.
    pub fn new(strategy: WarpStrategy) -> Self {
        Self {
            strategy: Some(strategy),
            state: WarpState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> WarpState {
        self.state
    }

    /// The strategy being applied, once solved.
    pub fn strategy(&self) -> Option<&WarpStrategy> {
        self.strategy.as_ref()
    }

    /// Solve the strategy for `op` on `side`, then warp `src` into `dst`.
    ///
    /// Solver failures (colinear or singular affine landmarks, too few landmarks
    /// or a failed polynomial fit) leave the engine in [`WarpState::Failed`].
    #[allow(clippy::too_many_arguments)]
    pub fn solve_and_run(
        &mut self,
        ctx: &SessionContext,
        side: ImageSide,
        op: TransformOp,
        params: &TransformParams,
        src: &Raster,
        dst: &mut Raster,
        overlay: &LandmarkOverlaySet,
    ) -> Result<LandmarkOverlaySet, TransformError> {
        match WarpStrategy::solve(ctx, side, op, params, src.size()) {
            Ok(strategy) => self.strategy = Some(strategy),
            Err(err) => {
                log::warn!("{side}: {op} could not be solved: {err}");
                self.state = WarpState::Failed;
                return Err(err);
            }
        }
        self.run(src, dst, overlay)
    }

    /// Warp `src` into `dst` and return the remapped overlay.
    ///
    /// On error the engine ends in [`WarpState::Failed`] and `dst` must be discarded.
    pub fn run(
        &mut self,
        src: &Raster,
        dst: &mut Raster,
        overlay: &LandmarkOverlaySet,
    ) -> Result<LandmarkOverlaySet, TransformError> {
        let Some(strategy) = &self.strategy else {
            self.state = WarpState::Failed;
            return Err(TransformError::InvalidParameter(
                "no warp strategy has been solved".to_string(),
            ));
        };

        self.state = WarpState::Mapping;
        let mapped = match strategy {
            WarpStrategy::Pseudo3d { projection, .. } => warp_pseudo3d(src, dst, projection),
            reverse => warp_reverse(src, dst, reverse),
        };
        if let Err(err) = mapped {
            self.state = WarpState::Failed;
            return Err(err.into());
        }

        self.state = WarpState::Remapping;
        let overlay = overlay.remapped(|p| strategy.overlay_point(p, src));

        self.state = WarpState::Done;
        Ok(overlay)
    }
}
