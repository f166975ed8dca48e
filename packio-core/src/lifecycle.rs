//! Process start/stop sequencing for the packaging pipeline.
//!
//! The manager is signal-agnostic: the caller supplies a shutdown future and
//! translates OS signals into it at the process boundary.

use crate::packager::{JobSource, Packager};
use futures_util::future::join_all;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

/// Drain budget applied when none is configured.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Starting,
    Running,
    Draining,
    Stopped,
}

/// How a drain ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// The queue emptied and every worker returned to idle within the budget.
    Completed,
    /// The budget elapsed first; remaining jobs were abandoned.
    DeadlineElapsed,
}

/// Owns the packager's shutdown sequencing.
///
/// States move Starting → Running → Draining → Stopped; the terminal state is
/// reached whether or not the drain finished within its budget, and the
/// process is expected to exit 0 either way.
pub struct LifecycleManager {
    packager: Packager,
    drain_timeout: Duration,
    state_tx: watch::Sender<LifecycleState>,
}

impl LifecycleManager {
    pub fn new(packager: Packager, drain_timeout: Duration) -> Self {
        let (state_tx, _) = watch::channel(LifecycleState::Starting);
        Self {
            packager,
            drain_timeout,
            state_tx,
        }
    }

    /// Observe lifecycle state transitions.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state_tx.subscribe()
    }

    /// Submission handle for the managed packager.
    pub fn source(&self) -> JobSource {
        self.packager.source()
    }

    /// Run until the shutdown future resolves, then drain within the budget.
    pub async fn run<F>(self, shutdown: F) -> DrainOutcome
    where
        F: Future<Output = ()>,
    {
        let Self {
            packager,
            drain_timeout,
            state_tx,
        } = self;

        let _ = state_tx.send(LifecycleState::Running);
        shutdown.await;

        let _ = state_tx.send(LifecycleState::Draining);
        let (source, workers) = packager.into_parts();
        source.stop();
        tracing::info!("Draining packaging queue, budget {:?}", drain_timeout);

        let aborts: Vec<_> = workers.iter().map(|handle| handle.abort_handle()).collect();
        let outcome = match tokio::time::timeout(drain_timeout, join_all(workers)).await {
            Ok(_) => DrainOutcome::Completed,
            Err(_) => {
                for abort in aborts {
                    abort.abort();
                }
                tracing::warn!(
                    "Drain deadline elapsed after {:?}; abandoning in-flight jobs",
                    drain_timeout
                );
                DrainOutcome::DeadlineElapsed
            }
        };

        let _ = state_tx.send(LifecycleState::Stopped);
        tracing::info!("Packaging pipeline stopped");
        outcome
    }
}
