#![deny(missing_docs)]
#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use flicker_align as align;

#[doc(inline)]
pub use flicker_image as image;

#[doc(inline)]
pub use flicker_imgproc as imgproc;

/// Engine configuration.
pub mod config;

/// Session context shared by the invocations of one image pair.
pub mod context;

mod dispatch;

/// Error types for the transform engine.
pub mod error;

/// Redraw suppression flag.
pub mod gate;

/// Image model and display collaborators.
pub mod model;

/// Operation selector and image sides.
pub mod op;

/// Background execution of transforms.
pub mod orchestrator;

/// Plugin operations.
pub mod plugin;

/// Invocation parameters.
pub mod session;

/// Geometric warps with landmark overlay remapping.
pub mod warp_engine;

pub use crate::config::EngineConfig;
pub use crate::context::SessionContext;
pub use crate::error::TransformError;
pub use crate::gate::{RedrawGate, RedrawGuard};
pub use crate::model::{DisplaySink, ImageModel, MemoryImageStore, SourceImage, TransformReport};
pub use crate::op::{ImageSide, Target, TransformOp};
pub use crate::orchestrator::{TransformOrchestrator, TransformTask};
pub use crate::plugin::{PluginRegistry, TransformPlugin};
pub use crate::session::{TransformParams, TransformSession};
pub use crate::warp_engine::{GeometricWarpEngine, WarpState, WarpStrategy};
