use std::sync::Arc;

use flicker_align::{LandmarkOverlaySet, LandmarkTable, LeastSquaresSolver, SpatialSolver};
use flicker_imgproc::guard::GuardRegion;

use crate::config::EngineConfig;
use crate::op::ImageSide;
use crate::plugin::PluginRegistry;

/// State shared by the invocations of one image pair.
///
/// Filters and warps only read it; the orchestrator updates the overlays and
/// guard margins when it commits an output.
#[derive(Clone)]
pub struct SessionContext {
    /// Engine settings.
    pub config: EngineConfig,
    /// Registered plugin operations.
    pub plugins: PluginRegistry,
    landmarks: LandmarkTable,
    landmark_revision: u64,
    overlays: [LandmarkOverlaySet; 2],
    guards: [Option<GuardRegion>; 2],
    spatial_solver: Arc<dyn SpatialSolver>,
}

impl SessionContext {
    /// A context with no landmarks and the bundled least squares spatial solver.
    pub fn new(config: EngineConfig) -> Self {
        let guard = config.guard;
        Self {
            config,
            plugins: PluginRegistry::default(),
            landmarks: LandmarkTable::default(),
            landmark_revision: 0,
            overlays: Default::default(),
            guards: [guard, guard],
            spatial_solver: Arc::new(LeastSquaresSolver),
        }
    }

    /// Replace the spatial solver used by polynomial warps.
    pub fn with_spatial_solver(mut self, solver: impl SpatialSolver + 'static) -> Self {
        self.spatial_solver = Arc::new(solver);
        self
    }

    /// Replace the landmark table and reset both overlays to it.
    pub fn set_landmarks(&mut self, table: LandmarkTable) {
        self.overlays = [
            LandmarkOverlaySet::new(table.points(false)),
            LandmarkOverlaySet::new(table.points(true)),
        ];
        self.landmarks = table;
        self.landmark_revision += 1;
    }

    /// Bumped by every [`SessionContext::set_landmarks`].
    pub fn landmark_revision(&self) -> u64 {
        self.landmark_revision
    }

    /// The shared landmark table.
    pub fn landmarks(&self) -> &LandmarkTable {
        &self.landmarks
    }

    /// Overlay coordinates of `side`.
    pub fn overlay(&self, side: ImageSide) -> &LandmarkOverlaySet {
        &self.overlays[side.index()]
    }

    pub(crate) fn set_overlay(&mut self, side: ImageSide, overlay: LandmarkOverlaySet) {
        self.overlays[side.index()] = overlay;
    }

    /// Guard border currently around the raster of `side`.
    pub fn guard(&self, side: ImageSide) -> Option<GuardRegion> {
        self.guards[side.index()]
    }

    pub(crate) fn set_guard(&mut self, side: ImageSide, guard: Option<GuardRegion>) {
        self.guards[side.index()] = guard;
    }

    /// The spatial solver collaborator.
    pub fn spatial_solver(&self) -> Arc<dyn SpatialSolver> {
        self.spatial_solver.clone()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("config", &self.config)
            .field("plugins", &self.plugins)
            .field("landmarks", &self.landmarks.len())
            .field("landmark_revision", &self.landmark_revision)
            .field("guards", &self.guards)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flicker_align::Landmark;

    #[test]
    fn landmarks_reset_overlays() {
        let mut ctx = SessionContext::default();
        assert_eq!(ctx.landmark_revision(), 0);
        ctx.set_landmarks(LandmarkTable::new(vec![Landmark::new([1.0, 2.0], [3.0, 4.0])]));
        assert_eq!(ctx.landmark_revision(), 1);
        assert_eq!(ctx.overlay(ImageSide::Left).input(), &[[1.0, 2.0]]);
        assert_eq!(ctx.overlay(ImageSide::Right).mapped(), &[[3.0, 4.0]]);
        assert!(ctx.guard(ImageSide::Left).is_none());
    }
}
