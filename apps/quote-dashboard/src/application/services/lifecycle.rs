//! Ingestion Lifecycle
//!
//! Holds the background tasks that feed the quote store and stops them with
//! a bounded wait.

use std::time::Duration;

use tokio::task::JoinHandle;

/// How ingestion shutdown ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every task finished on its own.
    Completed,
    /// The timeout elapsed and the remaining tasks were aborted.
    TimedOut,
}

/// Named background tasks owned by the orchestrator.
#[derive(Debug, Default)]
pub struct IngestionTasks {
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl IngestionTasks {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a spawned task.
    pub fn push(&mut self, name: &'static str, handle: JoinHandle<()>) {
        self.handles.push((name, handle));
    }

    /// Number of tracked tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Check if no task is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait up to `timeout` for all tasks, then abort whatever is left.
    ///
    /// The caller is expected to have cancelled the shared token first.
    pub async fn stop(self, timeout: Duration) -> ShutdownOutcome {
        let deadline = tokio::time::Instant::now() + timeout;
        let mut outcome = ShutdownOutcome::Completed;

        for (name, mut handle) in self.handles {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => tracing::debug!(task = name, "Task finished"),
                Ok(Err(e)) => tracing::warn!(task = name, error = %e, "Task ended abnormally"),
                Err(_) => {
                    handle.abort();
                    outcome = ShutdownOutcome::TimedOut;
                    tracing::warn!(
                        task = name,
                        timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                        "Task did not stop in time, aborted"
                    );
                }
            }
        }

        outcome
    }
}
