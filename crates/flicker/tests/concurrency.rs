use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use flicker::{
    align::{Landmark, LandmarkTable},
    image::{packed::pack_gray, Raster},
    ImageSide, MemoryImageStore, RedrawGate, SessionContext, Target, TransformError,
    TransformOp, TransformOrchestrator, TransformParams, TransformPlugin,
};

/// Copies its input, but only after being released.
struct Blocking {
    started: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl TransformPlugin for Blocking {
    fn name(&self) -> &str {
        "blocking"
    }

    fn apply(
        &self,
        src: &Raster,
        dst: &mut Raster,
        _: &TransformParams,
    ) -> Result<(), TransformError> {
        let _ = self.started.lock().map(|tx| tx.send(()));
        let _ = self
            .release
            .lock()
            .map(|rx| rx.recv_timeout(Duration::from_secs(10)));
        dst.as_slice_mut().copy_from_slice(src.as_slice());
        Ok(())
    }
}

fn blocking() -> (Blocking, Receiver<()>, Sender<()>) {
    let (started_tx, started_rx) = channel();
    let (release_tx, release_rx) = channel();
    let plugin = Blocking {
        started: Mutex::new(started_tx),
        release: Mutex::new(release_rx),
    };
    (plugin, started_rx, release_tx)
}

#[test]
fn second_invocation_on_busy_side_is_refused() -> Result<(), TransformError> {
    let store = Arc::new(MemoryImageStore::default());
    for side in [ImageSide::Left, ImageSide::Right] {
        store.load(side, Raster::from_size_val([8, 8].into(), pack_gray(3))?, false);
    }

    let (plugin, started_rx, release_tx) = blocking();
    let mut ctx = SessionContext::default();
    ctx.plugins.register(1, plugin);

    let gate = RedrawGate::default();
    let orchestrator =
        TransformOrchestrator::new(ctx, store.clone(), store.clone()).with_gate(gate.clone());
    let params = TransformParams::default();

    let task = orchestrator.submit(TransformOp::Plugin(1), Target::Right, &params)?;
    started_rx
        .recv_timeout(Duration::from_secs(10))
        .map_err(|_| TransformError::WorkerPanicked)?;

    assert!(gate.is_suppressed());
    assert!(orchestrator.is_busy(ImageSide::Right));
    assert_eq!(
        orchestrator.submit(TransformOp::Complement, Target::Right, &params).err(),
        Some(TransformError::SideBusy(ImageSide::Right))
    );
    assert_eq!(
        orchestrator.submit(TransformOp::Complement, Target::Both, &params).err(),
        Some(TransformError::SideBusy(ImageSide::Right))
    );

    // the other side is free
    orchestrator.run_blocking(TransformOp::Complement, Target::Left, &params)?;
    assert_eq!(store.commits(ImageSide::Left), 1);
    assert_eq!(store.commits(ImageSide::Right), 0);

    release_tx.send(()).map_err(|_| TransformError::WorkerPanicked)?;
    let report = task.join()?;
    assert_eq!(report.sides, vec![ImageSide::Right]);
    assert_eq!(store.commits(ImageSide::Right), 1);
    assert!(!gate.is_suppressed());

    // released after completion
    orchestrator.run_blocking(TransformOp::Complement, Target::Right, &params)?;
    assert_eq!(store.commits(ImageSide::Right), 2);
    Ok(())
}

#[test]
fn landmarks_replaced_mid_run_are_kept() -> Result<(), TransformError> {
    let store = Arc::new(MemoryImageStore::default());
    store.load(ImageSide::Right, Raster::from_size_val([8, 8].into(), pack_gray(3))?, false);

    let (plugin, started_rx, release_tx) = blocking();
    let mut ctx = SessionContext::default();
    ctx.plugins.register(1, plugin);
    ctx.set_landmarks(LandmarkTable::new(vec![Landmark::new([1.0, 1.0], [2.0, 2.0])]));

    let orchestrator = TransformOrchestrator::new(ctx, store.clone(), store.clone())
        .with_gate(RedrawGate::default());
    let task =
        orchestrator.submit(TransformOp::Plugin(1), Target::Right, &TransformParams::default())?;
    started_rx
        .recv_timeout(Duration::from_secs(10))
        .map_err(|_| TransformError::WorkerPanicked)?;

    orchestrator.update_context(|ctx| {
        ctx.set_landmarks(LandmarkTable::new(vec![Landmark::new([5.0, 6.0], [7.0, 4.0])]))
    });
    release_tx.send(()).map_err(|_| TransformError::WorkerPanicked)?;
    task.join()?;

    // the raster is committed, the overlay of the new table survives
    assert_eq!(store.commits(ImageSide::Right), 1);
    orchestrator.with_context(|ctx| {
        assert_eq!(ctx.overlay(ImageSide::Right).input(), &[[7.0, 4.0]]);
        assert_eq!(ctx.overlay(ImageSide::Right).mapped(), &[[7.0, 4.0]]);
    });
    Ok(())
}
