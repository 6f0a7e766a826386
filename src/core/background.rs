/*
 * Runs the pipeline off the interactive thread. A `BackgroundRunner` owns a
 * single run slot: while one worker is in flight every further start request
 * is rejected, so two runs can never write into the same durable output
 * folders at the same time. The worker reports each completed stage and then
 * exactly one final outcome over an `mpsc` channel, which the presenter drains
 * without blocking.
 */
use super::models::{PipelineStage, RunReport, RunRequest};
use super::pipeline::{PipelineError, PipelineOrchestrator};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvError, TryRecvError};
use std::thread::{self, JoinHandle};

const WORKER_THREAD_NAME: &str = "pipeline-worker";

#[derive(Debug)]
pub enum BackgroundError {
    AlreadyRunning,
    Spawn(io::Error),
}

impl std::fmt::Display for BackgroundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackgroundError::AlreadyRunning => {
                write!(f, "A processing run is already in progress")
            }
            BackgroundError::Spawn(e) => write!(f, "Failed to start the processing worker: {e}"),
        }
    }
}

impl std::error::Error for BackgroundError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BackgroundError::Spawn(e) => Some(e),
            BackgroundError::AlreadyRunning => None,
        }
    }
}

/* Messages flowing from the worker back to the interactive thread. */
#[derive(Debug)]
pub enum RunEvent {
    Progress(PipelineStage),
    Finished(Result<RunReport, PipelineError>),
}

/*
 * Holds the run slot for the lifetime of a worker. Releasing happens in
 * `Drop`, so the slot frees up even when the worker unwinds.
 */
struct RunSlotGuard {
    slot: Arc<AtomicBool>,
}

impl RunSlotGuard {
    fn try_acquire(slot: &Arc<AtomicBool>) -> Option<Self> {
        slot.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunSlotGuard {
                slot: Arc::clone(slot),
            })
    }
}

impl Drop for RunSlotGuard {
    fn drop(&mut self) {
        self.slot.store(false, Ordering::Release);
        log::trace!("BackgroundRunner: Run slot released.");
    }
}

/* The interactive thread's view of one in-flight run. */
pub struct RunHandle {
    events: Receiver<RunEvent>,
    worker: Option<JoinHandle<()>>,
}

impl RunHandle {
    /* Returns the next pending event without blocking, if any. */
    pub fn try_next_event(&self) -> Option<RunEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /* Blocks until the next event; `None` once the worker has gone away. */
    pub fn wait_for_event(&self) -> Option<RunEvent> {
        match self.events.recv() {
            Ok(event) => Some(event),
            Err(RecvError) => None,
        }
    }

    /* Blocks until the final outcome, discarding progress events. */
    pub fn wait_for_outcome(&self) -> Result<RunReport, PipelineError> {
        while let Some(event) = self.wait_for_event() {
            if let RunEvent::Finished(outcome) = event {
                return outcome;
            }
        }
        Err(PipelineError::WorkerPanicked)
    }

    pub fn join(mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("BackgroundRunner: Worker thread panicked outside the pipeline.");
            }
        }
    }
}

pub struct BackgroundRunner {
    orchestrator: Arc<PipelineOrchestrator>,
    run_slot: Arc<AtomicBool>,
}

impl BackgroundRunner {
    pub fn new(orchestrator: Arc<PipelineOrchestrator>) -> Self {
        BackgroundRunner {
            orchestrator,
            run_slot: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.run_slot.load(Ordering::Acquire)
    }

    /*
     * Starts `request` on a new worker thread and returns immediately.
     * Rejects the request with `AlreadyRunning` while another run holds the
     * slot; in that case nothing is spawned.
     */
    pub fn try_start(&self, request: RunRequest) -> Result<RunHandle, BackgroundError> {
        let guard = RunSlotGuard::try_acquire(&self.run_slot).ok_or_else(|| {
            log::warn!("BackgroundRunner: Start rejected, a run is already in progress.");
            BackgroundError::AlreadyRunning
        })?;

        let (sender, events) = mpsc::channel();
        let orchestrator = Arc::clone(&self.orchestrator);
        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let _guard = guard;
                let progress_sender = sender.clone();
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    orchestrator.run(&request, &mut |stage| {
                        // The receiver may already be gone; the run still completes.
                        let _ = progress_sender.send(RunEvent::Progress(stage));
                    })
                }))
                .unwrap_or_else(|_| {
                    log::error!("BackgroundRunner: Pipeline panicked on the worker thread.");
                    Err(PipelineError::WorkerPanicked)
                });
                if sender.send(RunEvent::Finished(outcome)).is_err() {
                    log::warn!("BackgroundRunner: Run finished but nobody is listening.");
                }
            })
            .map_err(BackgroundError::Spawn)?;

        log::debug!("BackgroundRunner: Worker started.");
        Ok(RunHandle {
            events,
            worker: Some(worker),
        })
    }
}
