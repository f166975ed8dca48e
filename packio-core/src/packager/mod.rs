//! Bounded worker pool turning packaging jobs into stored, recorded content.

pub mod source;

use crate::repository::{ContentRecord, ContentRepository};
use crate::storage::{PublicationStore, compute_hash};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

pub use source::{JobSource, PackagingJob, PackagingTicket};

/// Number of jobs the incoming queue holds before submission blocks.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Bounded worker pool draining the packaging queue.
///
/// Each worker claims one job at a time, persists the payload through the
/// publication store, records the resulting metadata, and delivers the
/// outcome on the job's result channel. Failed jobs are never retried here;
/// retry policy belongs to the producer.
pub struct Packager {
    source: JobSource,
    workers: Vec<JoinHandle<()>>,
}

impl Packager {
    /// Spawn `workers` packaging workers over a queue with the default
    /// capacity.
    pub fn new(
        store: Arc<dyn PublicationStore>,
        repository: Arc<dyn ContentRepository>,
        workers: usize,
    ) -> Self {
        Self::with_queue_capacity(store, repository, workers, DEFAULT_QUEUE_CAPACITY)
    }

    /// Spawn `workers` packaging workers over a queue holding at most
    /// `queue_capacity` submitted jobs.
    pub fn with_queue_capacity(
        store: Arc<dyn PublicationStore>,
        repository: Arc<dyn ContentRepository>,
        workers: usize,
        queue_capacity: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let source = JobSource::new(tx);
        let rx = Arc::new(Mutex::new(rx));

        let worker_count = workers.max(1);
        let mut handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let rx = rx.clone();
            let store = store.clone();
            let repository = repository.clone();
            handles.push(tokio::spawn(async move {
                worker_loop(worker_id, rx, store, repository).await;
            }));
        }

        Self {
            source,
            workers: handles,
        }
    }

    /// Submission handle for this packager's queue.
    pub fn source(&self) -> JobSource {
        self.source.clone()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub(crate) fn into_parts(self) -> (JobSource, Vec<JoinHandle<()>>) {
        (self.source, self.workers)
    }

    /// Stop the source and wait for the workers to drain the queue.
    pub async fn shutdown(self) {
        let (source, workers) = self.into_parts();
        source.stop();
        futures_util::future::join_all(workers).await;
    }
}

async fn worker_loop(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<PackagingJob>>>,
    store: Arc<dyn PublicationStore>,
    repository: Arc<dyn ContentRepository>,
) {
    loop {
        // Claim exactly one job; the lock is released before any storage I/O.
        let job = {
            let mut guard = rx.lock().await;
            guard.recv().await
        };

        let Some(job) = job else {
            tracing::debug!("Packaging worker {} idle, queue closed", worker_id);
            break;
        };

        let PackagingJob {
            content_id,
            payload,
            result_tx,
        } = job;

        let length = payload.len() as u64;
        let sha256 = compute_hash(&payload);

        let result = match store.add(&content_id, payload).await {
            Ok(location) => {
                let record = ContentRecord {
                    content_id: content_id.clone(),
                    location: location.clone(),
                    length,
                    sha256,
                    created_at: chrono::Utc::now(),
                };
                repository.save(&record).await.map(|_| location)
            }
            Err(error) => Err(error),
        };

        match &result {
            Ok(location) => {
                tracing::debug!("Worker {} packaged {} at {}", worker_id, content_id, location)
            }
            Err(error) => {
                tracing::warn!("Worker {} failed to package {}: {}", worker_id, content_id, error)
            }
        }

        // The producer may have dropped its ticket; nothing to deliver then.
        let _ = result_tx.send(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PackError, Result};
    use crate::repository::SqliteRepository;
    use crate::storage::{FileSystemStore, StorageLocation};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    struct NullRepository;

    #[async_trait]
    impl ContentRepository for NullRepository {
        async fn save(&self, _record: &ContentRecord) -> Result<()> {
            Ok(())
        }

        async fn get(&self, _content_id: &str) -> Result<Option<ContentRecord>> {
            Ok(None)
        }
    }

    struct FailingStore;

    #[async_trait]
    impl PublicationStore for FailingStore {
        async fn add(&self, _content_id: &str, _payload: Bytes) -> Result<StorageLocation> {
            Err(PackError::Transport("bucket unreachable".to_string()))
        }

        async fn get(&self, content_id: &str) -> Result<Bytes> {
            Err(PackError::NotFound(content_id.to_string()))
        }

        async fn delete(&self, _content_id: &str) -> Result<()> {
            Ok(())
        }
    }

    /// Store that parks every `add` until a permit is released; used to keep
    /// a worker busy at a known point.
    struct GatedStore {
        started: mpsc::UnboundedSender<()>,
        gate: Arc<Semaphore>,
    }

    #[async_trait]
    impl PublicationStore for GatedStore {
        async fn add(&self, content_id: &str, _payload: Bytes) -> Result<StorageLocation> {
            let _ = self.started.send(());
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|_| PackError::Internal("gate closed".to_string()))?;
            permit.forget();
            Ok(StorageLocation::new(format!("gated://{}", content_id)))
        }

        async fn get(&self, content_id: &str) -> Result<Bytes> {
            Err(PackError::NotFound(content_id.to_string()))
        }

        async fn delete(&self, _content_id: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_more_jobs_than_workers_all_resolve() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileSystemStore::new(
            temp_dir.path(),
            "https://cdn.example.com/files",
        ));
        let repository =
            Arc::new(SqliteRepository::new(temp_dir.path().join("contents.sqlite")).unwrap());

        let packager = Packager::new(store, repository.clone(), 2);
        let source = packager.source();

        let mut tickets = Vec::new();
        for index in 0..6 {
            let content_id = format!("pub-{}", index);
            let payload = Bytes::from(format!("payload {}", index));
            tickets.push((content_id.clone(), source.submit(content_id, payload).await.unwrap()));
        }

        for (content_id, ticket) in tickets {
            let location = ticket.wait().await.unwrap();
            assert_eq!(
                location.as_str(),
                format!("https://cdn.example.com/files/{}", content_id)
            );

            let record = repository.get(&content_id).await.unwrap().unwrap();
            assert_eq!(record.location, location);
        }

        packager.shutdown().await;
    }

    #[tokio::test]
    async fn test_store_failure_is_delivered_not_recorded() {
        let temp_dir = tempfile::tempdir().unwrap();
        let repository =
            Arc::new(SqliteRepository::new(temp_dir.path().join("contents.sqlite")).unwrap());

        let packager = Packager::new(Arc::new(FailingStore), repository.clone(), 1);
        let source = packager.source();

        let ticket = source.submit("pub-1", Bytes::from("payload")).await.unwrap();
        let result = ticket.wait().await;
        assert!(matches!(result, Err(PackError::Transport(_))));

        assert!(repository.get("pub-1").await.unwrap().is_none());
        packager.shutdown().await;
    }

    #[tokio::test]
    async fn test_full_queue_blocks_submission() {
        let (started_tx, mut started_rx) = mpsc::unbounded_channel();
        let gate = Arc::new(Semaphore::new(0));
        let store = Arc::new(GatedStore {
            started: started_tx,
            gate: gate.clone(),
        });

        let packager = Packager::with_queue_capacity(store, Arc::new(NullRepository), 1, 1);
        let source = packager.source();

        // First job is claimed by the only worker and parks in the store.
        let first = source.submit("pub-1", Bytes::from("a")).await.unwrap();
        started_rx.recv().await.unwrap();

        // Second job occupies the single queue slot.
        let second = source.submit("pub-2", Bytes::from("b")).await.unwrap();

        // Queue is now full for non-blocking submission.
        let rejected = source.try_submit("pub-3", Bytes::from("c"));
        assert!(matches!(rejected, Err(PackError::QueueFull)));

        // A blocking submission waits instead of failing.
        let blocked_source = source.clone();
        let mut blocked = tokio::spawn(async move {
            blocked_source
                .submit("pub-4", Bytes::from("d"))
                .await
                .unwrap()
                .wait()
                .await
        });
        let not_yet = tokio::time::timeout(Duration::from_millis(50), &mut blocked).await;
        assert!(not_yet.is_err());

        // Release the workers; every job completes exactly once.
        gate.add_permits(3);
        first.wait().await.unwrap();
        second.wait().await.unwrap();
        blocked.await.unwrap().unwrap();

        packager.shutdown().await;
    }

    #[tokio::test]
    async fn test_jobs_queued_before_stop_still_complete() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileSystemStore::new(
            temp_dir.path(),
            "https://cdn.example.com/files",
        ));

        let packager = Packager::new(store, Arc::new(NullRepository), 1);
        let source = packager.source();

        let first = source.submit("pub-1", Bytes::from("a")).await.unwrap();
        let second = source.submit("pub-2", Bytes::from("b")).await.unwrap();
        source.stop();

        assert!(matches!(
            source.submit("pub-3", Bytes::from("c")).await,
            Err(PackError::QueueClosed)
        ));

        first.wait().await.unwrap();
        second.wait().await.unwrap();
        packager.shutdown().await;
    }

    #[tokio::test]
    async fn test_worker_count_is_clamped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileSystemStore::new(
            temp_dir.path(),
            "https://cdn.example.com/files",
        ));

        let packager = Packager::new(store, Arc::new(NullRepository), 0);
        assert_eq!(packager.worker_count(), 1);
        packager.shutdown().await;
    }
}
