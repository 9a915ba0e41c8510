use std::path::Path;

use flicker_imgproc::{
    color::GrayWeights, guard::GuardRegion, resize::ResampleMode, resize::ZoomPolicy,
};
use serde::{Deserialize, Serialize};

use crate::error::TransformError;

/// Engine-wide settings shared by every invocation.
///
/// # Example
///
/// ```
/// use flicker::EngineConfig;
///
/// let config = EngineConfig::default().with_max_angle_deg(30.0);
/// assert_eq!(config.max_angle_deg, 30.0);
/// assert_eq!(config.colinear_threshold, 1.0);
///
/// let config = EngineConfig::from_json_str(r#"{ "min_zoom": 0.5 }"#).unwrap();
/// assert_eq!(config.min_zoom, 0.5);
/// assert_eq!(config.max_zoom, 8.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Affine triples with a colinearity residual below this are rejected.
    pub colinear_threshold: f64,
    /// Largest absolute pseudo-3D angle in degrees.
    pub max_angle_deg: f64,
    /// Smallest zoom magnification.
    pub min_zoom: f64,
    /// Largest zoom magnification.
    pub max_zoom: f64,
    /// Scaling algorithm of the zoom.
    pub resample_mode: ResampleMode,
    /// Guard border kept around the rasters, if any.
    pub guard: Option<GuardRegion>,
    /// Weights of the RGB to gray conversion.
    pub gray_weights: GrayWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            colinear_threshold: 1.0,
            max_angle_deg: 45.0,
            min_zoom: 0.125,
            max_zoom: 8.0,
            resample_mode: ResampleMode::Nearest,
            guard: None,
            gray_weights: GrayWeights::SourceLiteral,
        }
    }
}

impl EngineConfig {
    /// Set the colinearity threshold.
    pub fn with_colinear_threshold(mut self, threshold: f64) -> Self {
        self.colinear_threshold = threshold;
        self
    }

    /// Set the maximum pseudo-3D angle.
    pub fn with_max_angle_deg(mut self, angle: f64) -> Self {
        self.max_angle_deg = angle;
        self
    }

    /// Set the zoom bounds.
    pub fn with_zoom_bounds(mut self, min: f64, max: f64) -> Self {
        self.min_zoom = min;
        self.max_zoom = max;
        self
    }

    /// Set the zoom resampling mode.
    pub fn with_resample_mode(mut self, mode: ResampleMode) -> Self {
        self.resample_mode = mode;
        self
    }

    /// Set the guard border.
    pub fn with_guard(mut self, guard: Option<GuardRegion>) -> Self {
        self.guard = guard;
        self
    }

    /// Set the gray conversion weights.
    pub fn with_gray_weights(mut self, weights: GrayWeights) -> Self {
        self.gray_weights = weights;
        self
    }

    /// The zoom bounds as a policy.
    pub fn zoom_policy(&self) -> ZoomPolicy {
        ZoomPolicy {
            min: self.min_zoom,
            max: self.max_zoom,
        }
    }

    /// Check that the settings are usable.
    pub fn validate(&self) -> Result<(), TransformError> {
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom && self.max_zoom.is_finite()) {
            return Err(TransformError::Config(format!(
                "zoom bounds [{}, {}] are invalid",
                self.min_zoom, self.max_zoom
            )));
        }
        if !(self.max_angle_deg >= 0.0 && self.max_angle_deg <= 90.0) {
            return Err(TransformError::Config(format!(
                "max angle {} must lie in [0, 90]",
                self.max_angle_deg
            )));
        }
        if !(self.colinear_threshold >= 0.0) {
            return Err(TransformError::Config(
                "colinear threshold must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, TransformError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| TransformError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TransformError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| TransformError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }
}
