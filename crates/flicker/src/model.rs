use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use flicker_image::{ImageSize, Raster};

use crate::error::TransformError;
use crate::op::{ImageSide, TransformOp};

/// Input snapshot of one side.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    /// The currently displayed raster.
    pub raster: Raster,
    /// Whether gray 0 means no signal (dense regions are bright).
    pub black_is_zero: bool,
}

/// The image-model collaborator providing the rasters to transform.
pub trait ImageModel: Send + Sync {
    /// Snapshot of the currently displayed raster of `side`.
    fn source(&self, side: ImageSide) -> Option<SourceImage>;

    /// The untouched raster `side` was loaded with.
    fn original(&self, side: ImageSide) -> Option<Raster>;
}

/// Completion details handed to the display with each committed raster.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformReport {
    /// The operation that ran.
    pub op: TransformOp,
    /// The sides that were committed.
    pub sides: Vec<ImageSide>,
    /// Size of each side's input raster, in the order of `sides`.
    pub source_sizes: Vec<ImageSize>,
    /// Wall time from session start to commit.
    pub elapsed: std::time::Duration,
}

/// The display collaborator receiving finished rasters.
pub trait DisplaySink: Send + Sync {
    /// Publish the output of a finished invocation for `side`.
    fn commit(&self, side: ImageSide, raster: Raster, report: &TransformReport);

    /// The invocation on `side` was aborted; the previous raster stays displayed.
    fn aborted(&self, side: ImageSide, op: TransformOp, error: &TransformError);
}

#[derive(Debug, Clone)]
struct StoredSide {
    original: Raster,
    current: Raster,
    black_is_zero: bool,
    last_error: Option<String>,
    commits: usize,
}

/// In-memory image model and display, holding one raster per side.
///
/// Committed rasters replace the current one; the original is kept for restore.
#[derive(Debug, Default)]
pub struct MemoryImageStore {
    sides: Mutex<HashMap<ImageSide, StoredSide>>,
}

impl MemoryImageStore {
    fn with_sides<R>(&self, f: impl FnOnce(&mut HashMap<ImageSide, StoredSide>) -> R) -> R {
        let mut sides = self.sides.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut sides)
    }

    /// Load `raster` as both the original and the current raster of `side`.
    pub fn load(&self, side: ImageSide, raster: Raster, black_is_zero: bool) {
        self.with_sides(|sides| {
            sides.insert(
                side,
                StoredSide {
                    original: raster.clone(),
                    current: raster,
                    black_is_zero,
                    last_error: None,
                    commits: 0,
                },
            );
        });
    }

    /// The currently displayed raster of `side`.
    pub fn current(&self, side: ImageSide) -> Option<Raster> {
        self.with_sides(|sides| sides.get(&side).map(|s| s.current.clone()))
    }

    /// Message of the last aborted invocation on `side`.
    pub fn last_error(&self, side: ImageSide) -> Option<String> {
        self.with_sides(|sides| sides.get(&side).and_then(|s| s.last_error.clone()))
    }

    /// Number of rasters committed to `side`.
    pub fn commits(&self, side: ImageSide) -> usize {
        self.with_sides(|sides| sides.get(&side).map_or(0, |s| s.commits))
    }
}

impl ImageModel for MemoryImageStore {
    fn source(&self, side: ImageSide) -> Option<SourceImage> {
        self.with_sides(|sides| {
            sides.get(&side).map(|s| SourceImage {
                raster: s.current.clone(),
                black_is_zero: s.black_is_zero,
            })
        })
    }

    fn original(&self, side: ImageSide) -> Option<Raster> {
        self.with_sides(|sides| sides.get(&side).map(|s| s.original.clone()))
    }
}

impl DisplaySink for MemoryImageStore {
    fn commit(&self, side: ImageSide, raster: Raster, report: &TransformReport) {
        log::debug!("{side}: displaying {} after {:?}", report.op, report.elapsed);
        self.with_sides(|sides| {
            if let Some(stored) = sides.get_mut(&side) {
                stored.current = raster;
                stored.last_error = None;
                stored.commits += 1;
            }
        });
    }

    fn aborted(&self, side: ImageSide, op: TransformOp, error: &TransformError) {
        self.with_sides(|sides| {
            if let Some(stored) = sides.get_mut(&side) {
                stored.last_error = Some(format!("{op}: {error}"));
            }
        });
    }
}
