use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::JoinHandle;

use crate::context::SessionContext;
use crate::dispatch::{run_side, SideInput, SideOutput};
use crate::error::TransformError;
use crate::gate::RedrawGate;
use crate::model::{DisplaySink, ImageModel, TransformReport};
use crate::op::{ImageSide, Target, TransformOp};
use crate::session::{TransformParams, TransformSession};

/// Sides with an invocation in flight, released on drop.
struct SideReservation {
    in_flight: Arc<Mutex<HashSet<ImageSide>>>,
    sides: &'static [ImageSide],
}

impl SideReservation {
    fn acquire(
        in_flight: &Arc<Mutex<HashSet<ImageSide>>>,
        sides: &'static [ImageSide],
    ) -> Result<Self, TransformError> {
        let mut busy = in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(side) = sides.iter().find(|s| busy.contains(s)) {
            return Err(TransformError::SideBusy(*side));
        }
        busy.extend(sides.iter().copied());
        Ok(Self {
            in_flight: in_flight.clone(),
            sides,
        })
    }
}

impl Drop for SideReservation {
    fn drop(&mut self) {
        let mut busy = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        for side in self.sides {
            busy.remove(side);
        }
    }
}

/// A transform running on a worker thread.
#[derive(Debug)]
pub struct TransformTask {
    op: TransformOp,
    target: Target,
    handle: JoinHandle<Result<TransformReport, TransformError>>,
}

impl TransformTask {
    /// The operation being run.
    pub fn op(&self) -> TransformOp {
        self.op
    }

    /// The side(s) being written.
    pub fn target(&self) -> Target {
        self.target
    }

    /// Whether the worker has finished.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the worker and return its result.
    pub fn join(self) -> Result<TransformReport, TransformError> {
        self.handle
            .join()
            .map_err(|_| TransformError::WorkerPanicked)?
    }
}

/// Runs named transforms in the background and publishes their output.
///
/// Each invocation reserves its target side(s), suppresses redraw, snapshots the
/// input from the [`ImageModel`], computes every side, and only then commits
/// the outputs to the [`DisplaySink`]. A failure on any side commits nothing
/// and reports the error for every targeted side.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use flicker::{
///     ImageSide, MemoryImageStore, SessionContext, Target, TransformOp, TransformOrchestrator,
///     TransformParams,
/// };
/// use flicker::image::{packed::pack_gray, Raster, WHITE};
///
/// let store = Arc::new(MemoryImageStore::default());
/// store.load(ImageSide::Left, Raster::from_size_val([8, 8].into(), pack_gray(0)).unwrap(), false);
///
/// let orchestrator =
///     TransformOrchestrator::new(SessionContext::default(), store.clone(), store.clone());
/// let params = TransformParams::default();
/// orchestrator.run_blocking(TransformOp::Complement, Target::Left, &params).unwrap();
///
/// let shown = store.current(ImageSide::Left).unwrap();
/// assert!(shown.as_slice().iter().all(|&p| p == WHITE));
/// ```
pub struct TransformOrchestrator {
    ctx: Arc<RwLock<SessionContext>>,
    model: Arc<dyn ImageModel>,
    sink: Arc<dyn DisplaySink>,
    gate: RedrawGate,
    in_flight: Arc<Mutex<HashSet<ImageSide>>>,
}

impl TransformOrchestrator {
    /// Create an orchestrator using the process-wide redraw gate.
    pub fn new(
        ctx: SessionContext,
        model: Arc<dyn ImageModel>,
        sink: Arc<dyn DisplaySink>,
    ) -> Self {
        Self {
            ctx: Arc::new(RwLock::new(ctx)),
            model,
            sink,
            gate: RedrawGate::global().clone(),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Use `gate` instead of the process-wide gate.
    pub fn with_gate(mut self, gate: RedrawGate) -> Self {
        self.gate = gate;
        self
    }

    /// The redraw gate the display should poll.
    pub fn gate(&self) -> &RedrawGate {
        &self.gate
    }

    /// Read the session context.
    pub fn with_context<R>(&self, f: impl FnOnce(&SessionContext) -> R) -> R {
        let ctx = self.ctx.read().unwrap_or_else(PoisonError::into_inner);
        f(&ctx)
    }

    /// Modify the session context, e.g. to load landmarks or register plugins.
    ///
    /// Invocations already in flight keep the snapshot they started with.
    pub fn update_context<R>(&self, f: impl FnOnce(&mut SessionContext) -> R) -> R {
        let mut ctx = self.ctx.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut ctx)
    }

    /// Whether an invocation is in flight on `side`.
    pub fn is_busy(&self, side: ImageSide) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&side)
    }

    /// Start `op` on `target` in the background.
    ///
    /// # Errors
    ///
    /// Fails without starting any work if the parameters are invalid, the
    /// operation is an unregistered plugin, or a targeted side is busy
    /// ([`TransformError::SideBusy`]).
    pub fn submit(
        &self,
        op: TransformOp,
        target: Target,
        params: &TransformParams,
    ) -> Result<TransformTask, TransformError> {
        let ctx = self.with_context(SessionContext::clone);
        let session = TransformSession::new(op, target, params, &ctx.config)?;

        if let TransformOp::Plugin(slot) = op {
            if ctx.plugins.get(slot).is_none() {
                return Err(TransformError::UnknownOperation(op.to_string()));
            }
        }

        let reservation = SideReservation::acquire(&self.in_flight, target.sides())?;
        let redraw = self.gate.suppress();
        log::debug!("submitting {op} on {target:?}");

        let shared = self.ctx.clone();
        let model = self.model.clone();
        let sink = self.sink.clone();

        let mut session = session;
        let handle = std::thread::spawn(move || {
            let result = catch_unwind(AssertUnwindSafe(|| {
                execute(&ctx, &shared, model.as_ref(), sink.as_ref(), &mut session)
            }))
            .unwrap_or_else(|_| {
                let err = TransformError::WorkerPanicked;
                abort(sink.as_ref(), &session, &err);
                Err(err)
            });

            // commit or abort happened above; release the display and the sides
            drop(redraw);
            drop(reservation);
            result
        });

        Ok(TransformTask { op, target, handle })
    }

    /// Run `op` on `target` and wait for it.
    pub fn run_blocking(
        &self,
        op: TransformOp,
        target: Target,
        params: &TransformParams,
    ) -> Result<TransformReport, TransformError> {
        self.submit(op, target, params)?.join()
    }
}

fn abort(sink: &dyn DisplaySink, session: &TransformSession, err: &TransformError) {
    log::warn!("{} aborted after {:?}: {err}", session.op, session.elapsed());
    for &side in session.target.sides() {
        sink.aborted(side, session.op, err);
    }
}

fn compute_side(
    ctx: &SessionContext,
    model: &dyn ImageModel,
    session: &mut TransformSession,
    side: ImageSide,
) -> Result<SideOutput, TransformError> {
    let source = model.source(side).ok_or(TransformError::NoImage(side))?;
    session.set_source_size(side, source.raster.size());
    let original = match session.op {
        TransformOp::NormColor => model.original(side),
        _ => None,
    };
    log::debug!(
        "{side}: {} on {}x{}",
        session.op,
        source.raster.width(),
        source.raster.height()
    );

    let input = SideInput {
        side,
        source,
        original,
        overlay: ctx.overlay(side).clone(),
        guard: ctx.guard(side),
    };
    run_side(ctx, session.op, &session.params, input)
}

fn execute(
    ctx: &SessionContext,
    shared: &RwLock<SessionContext>,
    model: &dyn ImageModel,
    sink: &dyn DisplaySink,
    session: &mut TransformSession,
) -> Result<TransformReport, TransformError> {
    let sides = session.target.sides();

    let mut outputs = Vec::with_capacity(sides.len());
    for &side in sides {
        match compute_side(ctx, model, session, side) {
            Ok(output) => outputs.push((side, output)),
            Err(err) => {
                abort(sink, session, &err);
                return Err(err);
            }
        }
    }

    let report = TransformReport {
        op: session.op,
        sides: sides.to_vec(),
        source_sizes: sides.iter().filter_map(|&s| session.source_size(s)).collect(),
        elapsed: session.elapsed(),
    };

    {
        let mut shared = shared.write().unwrap_or_else(PoisonError::into_inner);
        // a new landmark table reset the overlays while this invocation ran
        let landmarks_current = shared.landmark_revision() == ctx.landmark_revision();
        if !landmarks_current {
            log::debug!("{}: landmarks replaced during the run, overlay kept", session.op);
        }
        for (side, output) in outputs.iter() {
            if landmarks_current {
                shared.set_overlay(*side, output.overlay.clone());
            }
            shared.set_guard(*side, output.guard);
        }
    }
    for (side, output) in outputs {
        sink.commit(side, output.raster, &report);
    }

    log::info!(
        "{} on {:?} done in {:?}",
        session.op,
        session.target,
        report.elapsed
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MemoryImageStore;
    use crate::plugin::TransformPlugin;
    use flicker_image::{packed::pack_gray, ImageError, ImageSize, Raster};

    fn store_with(side: ImageSide, value: u8) -> Arc<MemoryImageStore> {
        let store = Arc::new(MemoryImageStore::default());
        let raster = Raster::from_size_val([4, 4].into(), pack_gray(value)).unwrap();
        store.load(side, raster, false);
        store
    }

    fn orchestrator_for(
        ctx: SessionContext,
        store: &Arc<MemoryImageStore>,
    ) -> TransformOrchestrator {
        TransformOrchestrator::new(ctx, store.clone(), store.clone())
            .with_gate(RedrawGate::default())
    }

    /// Fails the way an oversized scratch buffer would.
    struct Exhausted;

    impl TransformPlugin for Exhausted {
        fn name(&self) -> &str {
            "exhausted"
        }

        fn apply(
            &self,
            _: &Raster,
            _: &mut Raster,
            _: &TransformParams,
        ) -> Result<(), TransformError> {
            Err(ImageError::AllocationFailed(1 << 40).into())
        }
    }

    #[test]
    fn both_commits_nothing_on_failure() {
        let store = store_with(ImageSide::Left, 10);
        let orchestrator = orchestrator_for(SessionContext::default(), &store);

        let params = TransformParams::default();
        let res = orchestrator.run_blocking(TransformOp::Complement, Target::Both, &params);
        assert_eq!(res, Err(TransformError::NoImage(ImageSide::Right)));
        assert_eq!(store.commits(ImageSide::Left), 0);
        let shown = store.current(ImageSide::Left).unwrap();
        assert_eq!(shown.as_slice()[0], pack_gray(10));
        assert!(store.last_error(ImageSide::Left).is_some());
        assert!(!orchestrator.is_busy(ImageSide::Left));
        assert!(!orchestrator.gate().is_suppressed());
    }

    #[test]
    fn allocation_failure_aborts_as_out_of_memory() {
        let store = store_with(ImageSide::Left, 10);
        let mut ctx = SessionContext::default();
        ctx.plugins.register(7, Exhausted);
        let orchestrator = orchestrator_for(ctx, &store);

        let params = TransformParams::default();
        let res = orchestrator.run_blocking(TransformOp::Plugin(7), Target::Left, &params);
        assert_eq!(
            res,
            Err(TransformError::OutOfMemory {
                side: ImageSide::Left,
                pixels: 1 << 40,
            })
        );
        assert_eq!(store.commits(ImageSide::Left), 0);
        let shown = store.current(ImageSide::Left).unwrap();
        assert_eq!(shown.as_slice()[0], pack_gray(10));
        let message = store.last_error(ImageSide::Left).unwrap();
        assert!(message.starts_with("plugin:7"), "{message}");
        assert!(message.contains("Out of memory"), "{message}");
        assert!(!orchestrator.is_busy(ImageSide::Left));
    }

    #[test]
    fn invalid_params_start_nothing() {
        let store = store_with(ImageSide::Right, 0);
        let orchestrator = orchestrator_for(SessionContext::default(), &store);
        let params = TransformParams {
            threshold1: 9,
            threshold2: 3,
            ..Default::default()
        };
        assert!(matches!(
            orchestrator.submit(TransformOp::Threshold, Target::Right, &params),
            Err(TransformError::InvalidParameter(_))
        ));
        assert!(matches!(
            orchestrator.submit(
                TransformOp::Plugin(2),
                Target::Right,
                &TransformParams::default()
            ),
            Err(TransformError::UnknownOperation(_))
        ));
        assert!(!orchestrator.is_busy(ImageSide::Right));
    }

    #[test]
    fn report_names_sides() {
        let store = store_with(ImageSide::Right, 0);
        let orchestrator = orchestrator_for(SessionContext::default(), &store);
        let report = orchestrator
            .run_blocking(TransformOp::FlipVert, Target::Right, &TransformParams::default())
            .unwrap();
        assert_eq!(report.op, TransformOp::FlipVert);
        assert_eq!(report.sides, vec![ImageSide::Right]);
        assert_eq!(
            report.source_sizes,
            vec![ImageSize {
                width: 4,
                height: 4,
            }]
        );
        assert_eq!(store.commits(ImageSide::Right), 1);
    }
}
