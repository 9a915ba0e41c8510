use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TransformError;

/// One of the two images being compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ImageSide {
    /// The first (left) image.
    Left,
    /// The second (right) image.
    Right,
}

impl ImageSide {
    /// Index of the side, 0 for left and 1 for right.
    pub fn index(self) -> usize {
        match self {
            ImageSide::Left => 0,
            ImageSide::Right => 1,
        }
    }
}

impl fmt::Display for ImageSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSide::Left => write!(f, "left"),
            ImageSide::Right => write!(f, "right"),
        }
    }
}

/// The image side(s) an invocation writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    /// Only the left image.
    Left,
    /// Only the right image.
    Right,
    /// Both images; outputs are committed together.
    Both,
}

impl Target {
    /// The sides covered by the target, left first.
    pub fn sides(self) -> &'static [ImageSide] {
        match self {
            Target::Left => &[ImageSide::Left],
            Target::Right => &[ImageSide::Right],
            Target::Both => &[ImageSide::Left, ImageSide::Right],
        }
    }
}

impl From<ImageSide> for Target {
    fn from(side: ImageSide) -> Self {
        match side {
            ImageSide::Left => Target::Left,
            ImageSide::Right => Target::Right,
        }
    }
}

impl FromStr for Target {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Target::Left),
            "right" => Ok(Target::Right),
            "both" => Ok(Target::Both),
            _ => Err(TransformError::InvalidParameter(format!(
                "unknown target `{s}`, expected left, right or both"
            ))),
        }
    }
}

/// A named transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransformOp {
    /// Blend with the gradient magnitude.
    SharpenGrad,
    /// Blend with the inverted Laplacian.
    SharpenLapl,
    /// Directional gradient magnitude.
    Gradient,
    /// Inverted Laplacian.
    Laplacian,
    /// 3x3 mean.
    Average,
    /// 3x3 median.
    Median,
    /// 3x3 maximum.
    Max3x3,
    /// 3x3 minimum.
    Min3x3,
    /// `255 - g`.
    Complement,
    /// Gray range slice.
    Threshold,
    /// Linear contrast stretch.
    ContrastEnhance,
    /// Histogram equalization.
    HistEqualize,
    /// Three-landmark affine warp.
    AffineWarp,
    /// Polynomial warp through all landmarks.
    PolyWarp,
    /// Pseudo-3D projection.
    Pseudo3D,
    /// Mirror left to right.
    FlipHoriz,
    /// Mirror top to bottom.
    FlipVert,
    /// Restore the original raster.
    NormColor,
    /// Gray to pseudocolor.
    PseudoColor,
    /// RGB to gray.
    Color2Gray,
    /// Zoom by the magnification parameter.
    DeZoom,
    /// An externally registered plugin.
    Plugin(u32),
}

impl TransformOp {
    /// Every built-in operation.
    pub const BUILTIN: [TransformOp; 21] = [
        TransformOp::SharpenGrad,
        TransformOp::SharpenLapl,
        TransformOp::Gradient,
        TransformOp::Laplacian,
        TransformOp::Average,
        TransformOp::Median,
        TransformOp::Max3x3,
        TransformOp::Min3x3,
        TransformOp::Complement,
        TransformOp::Threshold,
        TransformOp::ContrastEnhance,
        TransformOp::HistEqualize,
        TransformOp::AffineWarp,
        TransformOp::PolyWarp,
        TransformOp::Pseudo3D,
        TransformOp::FlipHoriz,
        TransformOp::FlipVert,
        TransformOp::NormColor,
        TransformOp::PseudoColor,
        TransformOp::Color2Gray,
        TransformOp::DeZoom,
    ];

    /// The identifier of a built-in operation, `None` for plugins.
    pub fn builtin_name(&self) -> Option<&'static str> {
        let name = match self {
            TransformOp::SharpenGrad => "SharpenGrad",
            TransformOp::SharpenLapl => "SharpenLapl",
            TransformOp::Gradient => "Gradient",
            TransformOp::Laplacian => "Laplacian",
            TransformOp::Average => "Average",
            TransformOp::Median => "Median",
            TransformOp::Max3x3 => "Max3x3",
            TransformOp::Min3x3 => "Min3x3",
            TransformOp::Complement => "Complement",
            TransformOp::Threshold => "Threshold",
            TransformOp::ContrastEnhance => "ContrastEnhance",
            TransformOp::HistEqualize => "HistEqualize",
            TransformOp::AffineWarp => "AffineWarp",
            TransformOp::PolyWarp => "PolyWarp",
            TransformOp::Pseudo3D => "Pseudo3D",
            TransformOp::FlipHoriz => "FlipHoriz",
            TransformOp::FlipVert => "FlipVert",
            TransformOp::NormColor => "NormColor",
            TransformOp::PseudoColor => "PseudoColor",
            TransformOp::Color2Gray => "Color2Gray",
            TransformOp::DeZoom => "DeZoom",
            TransformOp::Plugin(_) => return None,
        };
        Some(name)
    }

    /// Whether the operation moves pixels and remaps the landmark overlay.
    pub fn is_geometric(&self) -> bool {
        matches!(
            self,
            TransformOp::AffineWarp
                | TransformOp::PolyWarp
                | TransformOp::Pseudo3D
                | TransformOp::FlipHoriz
                | TransformOp::FlipVert
                | TransformOp::DeZoom
        )
    }
}

impl fmt::Display for TransformOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.builtin_name()) {
            (_, Some(name)) => write!(f, "{name}"),
            (TransformOp::Plugin(slot), None) => write!(f, "plugin:{slot}"),
            _ => Ok(()),
        }
    }
}

impl FromStr for TransformOp {
    type Err = TransformError;

    /// Parse a built-in identifier or `plugin:<slot>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(slot) = s.strip_prefix("plugin:") {
            return slot
                .parse()
                .map(TransformOp::Plugin)
                .map_err(|_| TransformError::UnknownOperation(s.to_string()));
        }

        TransformOp::BUILTIN
            .iter()
            .find(|op| op.builtin_name() == Some(s))
            .copied()
            .ok_or_else(|| TransformError::UnknownOperation(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() -> Result<(), TransformError> {
        for op in TransformOp::BUILTIN {
            assert_eq!(op.to_string().parse::<TransformOp>()?, op);
        }
        assert_eq!("plugin:7".parse::<TransformOp>()?, TransformOp::Plugin(7));
        assert_eq!(TransformOp::Plugin(7).to_string(), "plugin:7");
        Ok(())
    }

    #[test]
    fn unknown_names() {
        assert_eq!(
            "Sharpen".parse::<TransformOp>(),
            Err(TransformError::UnknownOperation("Sharpen".to_string()))
        );
        assert!("plugin:x".parse::<TransformOp>().is_err());
        assert!("gradient".parse::<TransformOp>().is_err());
    }

    #[test]
    fn target_sides() -> Result<(), TransformError> {
        assert_eq!(Target::Both.sides(), &[ImageSide::Left, ImageSide::Right]);
        assert_eq!("RIGHT".parse::<Target>()?, Target::Right);
        assert_eq!(Target::from(ImageSide::Left).sides(), &[ImageSide::Left]);
        Ok(())
    }
}
