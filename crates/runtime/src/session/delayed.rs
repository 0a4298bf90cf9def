use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::{Result, RuntimeError};

/// A script callback scheduled to run after a delay.
///
/// [`DelayedDispatch::cancel`] stops it cleanly if the delay has not
/// elapsed. Dropping the handle detaches it; the callback still runs.
#[derive(Debug)]
pub struct DelayedDispatch {
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<bool>,
}

impl DelayedDispatch {
    pub(crate) fn new(cancel: oneshot::Sender<()>, task: JoinHandle<bool>) -> Self {
        Self {
            cancel: Some(cancel),
            task,
        }
    }

    /// Requests cancellation. Returns false if the callback was already
    /// queued or cancellation was already requested.
    pub fn cancel(&mut self) -> bool {
        match self.cancel.take() {
            Some(tx) => tx.send(()).is_ok() && !self.task.is_finished(),
            None => false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the delay to resolve. Returns whether the callback was
    /// handed to the session worker.
    pub async fn join(self) -> Result<bool> {
        self.task.await.map_err(RuntimeError::WorkerJoin)
    }
}
