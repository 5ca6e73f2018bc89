use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::client::WotClient;
use crate::error::Result;
use crate::pipeline::{self, CancelFlag, PipelineOutcome, PipelineRequest, Progress};

/// Returned by [`Worker::start`] while another run is still in flight.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("a run is already in progress")]
pub struct WorkerBusy;

/// Runs the pipeline on a background task, one run at a time.
///
/// Owns the client and serializes runs through a busy flag.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone)]
pub struct Worker {
    client: Arc<WotClient>,
    busy: Arc<AtomicBool>,
}

/// Clears the busy flag when the run's task finishes, however it finishes.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Worker {
    pub fn new(client: WotClient) -> Self {
        Self {
            client: Arc::new(client),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Spawn a run in the background. Progress arrives through the returned handle.
    pub fn start(&self, request: PipelineRequest) -> std::result::Result<RunHandle, WorkerBusy> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("refusing to start a second run");
            return Err(WorkerBusy);
        }
        let guard = BusyGuard(Arc::clone(&self.busy));

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancelFlag::new();
        let client = Arc::clone(&self.client);
        let task_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            let _guard = guard;
            let result = pipeline::run_pipeline(&client, &request, &task_cancel, |progress| {
                // The receiver may be gone if nobody listens for progress.
                let _ = tx.send(progress);
            })
            .await;
            debug!(ok = result.is_ok(), "run finished");
            result
        });

        Ok(RunHandle {
            progress: rx,
            cancel,
            task,
        })
    }
}

/// Handle to one background run.
#[derive(Debug)]
pub struct RunHandle {
    progress: mpsc::UnboundedReceiver<Progress>,
    cancel: CancelFlag,
    task: JoinHandle<Result<PipelineOutcome>>,
}

impl RunHandle {
    /// Next progress message, or `None` once the run has ended.
    pub async fn next_progress(&mut self) -> Option<Progress> {
        self.progress.recv().await
    }

    /// Ask the run to stop at its next checkpoint.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Wait for the run to end and return its result.
    ///
    /// A panic inside the run surfaces as [`WotError::Aborted`](crate::WotError::Aborted).
    pub async fn wait(self) -> Result<PipelineOutcome> {
        self.task.await?
    }
}
