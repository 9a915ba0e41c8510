use std::time::Instant;

use flicker_image::ImageSize;
use flicker_imgproc::threshold::SliceMode;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::TransformError;
use crate::op::{ImageSide, Target, TransformOp};

/// Per-invocation numeric parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformParams {
    /// Pseudo-3D shear angle in degrees, clamped to the configured maximum.
    pub angle_deg: f64,
    /// Pseudo-3D lift in percent, 0 to 100.
    pub z_scale: u8,
    /// Sharpening weight in percent, 0 to 100.
    pub e_scale: u8,
    /// Lower threshold bound.
    pub threshold1: u8,
    /// Upper threshold bound.
    pub threshold2: u8,
    /// Which side of the threshold range is cleared.
    pub slice_mode: SliceMode,
    /// Zoom magnification, clamped to the configured bounds.
    pub zoom_mag: f64,
    /// Swap the roles of the two images when solving landmark warps.
    pub flip_landmarks: bool,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            angle_deg: 0.0,
            z_scale: 0,
            e_scale: 50,
            threshold1: 0,
            threshold2: 255,
            slice_mode: SliceMode::Outside,
            zoom_mag: 1.0,
            flip_landmarks: false,
        }
    }
}

impl TransformParams {
    /// Check the parameters and clamp them to their ranges.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::InvalidParameter`] for non-finite angle or zoom and
    /// for `threshold1 > threshold2`.
    pub fn validated(&self, config: &EngineConfig) -> Result<Self, TransformError> {
        if !self.angle_deg.is_finite() {
            return Err(TransformError::InvalidParameter(format!(
                "angle {} is not finite",
                self.angle_deg
            )));
        }
        if !self.zoom_mag.is_finite() || self.zoom_mag <= 0.0 {
            return Err(TransformError::InvalidParameter(format!(
                "zoom magnification {} must be positive",
                self.zoom_mag
            )));
        }
        if self.threshold1 > self.threshold2 {
            return Err(TransformError::InvalidParameter(format!(
                "threshold1 {} exceeds threshold2 {}",
                self.threshold1, self.threshold2
            )));
        }

        let max_angle = config.max_angle_deg;
        Ok(Self {
            angle_deg: self.angle_deg.clamp(-max_angle, max_angle),
            z_scale: self.z_scale.min(100),
            e_scale: self.e_scale.min(100),
            zoom_mag: config.zoom_policy().clamp(self.zoom_mag),
            ..self.clone()
        })
    }
}

/// One invocation: an operation, its target, the source size and its parameters.
#[derive(Debug, Clone)]
pub struct TransformSession {
    /// The operation.
    pub op: TransformOp,
    /// The side(s) written.
    pub target: Target,
    /// Validated parameters.
    pub params: TransformParams,
    source_sizes: [Option<ImageSize>; 2],
    started: Instant,
}

impl TransformSession {
    /// Start a session, validating `params` against `config`.
    pub fn new(
        op: TransformOp,
        target: Target,
        params: &TransformParams,
        config: &EngineConfig,
    ) -> Result<Self, TransformError> {
        Ok(Self {
            op,
            target,
            params: params.validated(config)?,
            source_sizes: [None; 2],
            started: Instant::now(),
        })
    }

    /// Size of the raster snapshotted for `side`, once the input has been taken.
    pub fn source_size(&self, side: ImageSide) -> Option<ImageSize> {
        self.source_sizes[side.index()]
    }

    pub(crate) fn set_source_size(&mut self, side: ImageSide, size: ImageSize) {
        self.source_sizes[side.index()] = Some(size);
    }

    /// Time since the session started.
    pub fn elapsed(&self) -> std::time::Duration {
        self.started.elapsed()
    }
}
