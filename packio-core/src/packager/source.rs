use crate::error::{PackError, Result};
use crate::storage::StorageLocation;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// One unit of packaging work.
///
/// Owned by the queue until a worker claims it; destroyed after the result
/// has been delivered.
pub struct PackagingJob {
    pub content_id: String,
    pub payload: Bytes,
    pub(crate) result_tx: oneshot::Sender<Result<StorageLocation>>,
}

/// Awaitable handle for a submitted job's outcome.
pub struct PackagingTicket {
    rx: oneshot::Receiver<Result<StorageLocation>>,
}

impl PackagingTicket {
    /// Wait for the job's result.
    ///
    /// A job abandoned at shutdown resolves to an error instead of hanging.
    pub async fn wait(self) -> Result<StorageLocation> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(PackError::Internal(
                "packaging job abandoned before completion".to_string(),
            )),
        }
    }
}

struct SourceInner {
    tx: std::sync::Mutex<Option<mpsc::Sender<PackagingJob>>>,
}

/// Submission side of the packaging queue.
///
/// The single allowed entry point into a packager. Clones share one
/// underlying queue; `stop` closes it for every clone while jobs already
/// queued keep draining.
#[derive(Clone)]
pub struct JobSource {
    inner: Arc<SourceInner>,
}

impl JobSource {
    pub(crate) fn new(tx: mpsc::Sender<PackagingJob>) -> Self {
        Self {
            inner: Arc::new(SourceInner {
                tx: std::sync::Mutex::new(Some(tx)),
            }),
        }
    }

    fn sender(&self) -> Result<mpsc::Sender<PackagingJob>> {
        let guard = self
            .inner
            .tx
            .lock()
            .map_err(|_| PackError::Internal("job source lock poisoned".to_string()))?;
        guard.clone().ok_or(PackError::QueueClosed)
    }

    /// Submit a job, waiting for a queue slot when the queue is at capacity.
    pub async fn submit(
        &self,
        content_id: impl Into<String>,
        payload: Bytes,
    ) -> Result<PackagingTicket> {
        let (job, ticket) = new_job(content_id.into(), payload);
        let tx = self.sender()?;
        tx.send(job).await.map_err(|_| PackError::QueueClosed)?;
        Ok(ticket)
    }

    /// Submit a job without waiting; fails when the queue is at capacity.
    pub fn try_submit(
        &self,
        content_id: impl Into<String>,
        payload: Bytes,
    ) -> Result<PackagingTicket> {
        let (job, ticket) = new_job(content_id.into(), payload);
        let tx = self.sender()?;
        match tx.try_send(job) {
            Ok(()) => Ok(ticket),
            Err(mpsc::error::TrySendError::Full(_)) => Err(PackError::QueueFull),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(PackError::QueueClosed),
        }
    }

    /// Refuse new submissions. Jobs already queued or in flight are not
    /// cancelled.
    pub fn stop(&self) {
        let mut guard = match self.inner.tx.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.take().is_some() {
            tracing::debug!("Job source stopped; new submissions are refused");
        }
    }

    pub fn is_stopped(&self) -> bool {
        match self.inner.tx.lock() {
            Ok(guard) => guard.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }
}

fn new_job(content_id: String, payload: Bytes) -> (PackagingJob, PackagingTicket) {
    let (result_tx, rx) = oneshot::channel();
    (
        PackagingJob {
            content_id,
            payload,
            result_tx,
        },
        PackagingTicket { rx },
    )
}
