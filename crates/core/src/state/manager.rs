//! Run manager for coordinating concurrent pipeline runs.
//!
//! The RunManager owns every run started by the process. Each run executes
//! on its own tokio task, so a client that stops listening never stops the
//! work; the client only receives a forwarded copy of the run's events.

use crate::engine::PipelineEngine;
use crate::error::PipelineError;
use crate::progress::{progress_channel, ProgressReceiver};
use crate::state::run::{apply_event, create_run, mark_cancelled};
use rf_protocol::{PipelineRequest, RunSnapshot};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error("Run {0} not found")]
    NotFound(Uuid),
    #[error("Run {0} has already finished")]
    AlreadyFinished(Uuid),
}

struct RunEntry {
    snapshot: RunSnapshot,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

type RunRegistry = Arc<Mutex<HashMap<Uuid, RunEntry>>>;

/// Manages all pipeline runs of this process.
///
/// The RunManager provides a centralized interface for:
/// - Starting runs in the background
/// - Cancelling a single run or every run
/// - Querying run snapshots
/// - Forgetting runs that finished long ago
pub struct RunManager {
    runs: RunRegistry,
    engine: Arc<PipelineEngine>,
    event_buffer: usize,
    /// Parent of every run's token; cancelled on shutdown.
    shutdown: CancellationToken,
}

impl RunManager {
    /// Create a new RunManager.
    ///
    /// # Arguments
    ///
    /// * `engine` - The engine executing runs
    /// * `event_buffer` - Progress buffer size per run
    pub fn new(engine: Arc<PipelineEngine>, event_buffer: usize) -> Self {
        Self {
            runs: Arc::new(Mutex::new(HashMap::new())),
            engine,
            event_buffer,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn engine(&self) -> &Arc<PipelineEngine> {
        &self.engine
    }

    /// Start a run in the background.
    ///
    /// Returns the run id together with the receiving end of its progress
    /// feed. Dropping the receiver does not affect the run.
    pub async fn start(&self, request: PipelineRequest) -> (Uuid, ProgressReceiver) {
        let id = Uuid::new_v4();
        let cancel = self.shutdown.child_token();

        let (engine_tx, mut engine_rx) = progress_channel(self.event_buffer);
        let (mut client_tx, client_rx) = progress_channel(self.event_buffer);

        // Register before spawning so the id is queryable immediately.
        let mut runs = self.runs.lock().await;
        runs.insert(
            id,
            RunEntry {
                snapshot: create_run(id),
                cancel: cancel.clone(),
                task: None,
            },
        );

        let engine = Arc::clone(&self.engine);
        let registry = Arc::clone(&self.runs);
        let source = if request.source.is_query() { "query" } else { "upload" };

        let task = tokio::spawn(
            async move {
                info!(source, "Run started");

                let relay = async {
                    while let Some(event) = engine_rx.recv().await {
                        if let Some(entry) = registry.lock().await.get_mut(&id) {
                            apply_event(&mut entry.snapshot, &event);
                        }
                        client_tx.emit(event);
                    }
                };
                let (result, ()) = tokio::join!(engine.run(request, engine_tx, cancel), relay);

                if matches!(result, Err(PipelineError::Cancelled)) {
                    if let Some(entry) = registry.lock().await.get_mut(&id) {
                        mark_cancelled(&mut entry.snapshot);
                    }
                }
                info!(ok = result.is_ok(), "Run finished");
            }
            .instrument(info_span!("run", run_id = %id)),
        );

        if let Some(entry) = runs.get_mut(&id) {
            entry.task = Some(task);
        }

        (id, client_rx)
    }

    /// Request cancellation of a run.
    ///
    /// The run stops at its next suspension point, cleans up its working
    /// directory and reports a terminal error event.
    ///
    /// # Errors
    ///
    /// `RunError::NotFound` for an unknown id and `RunError::AlreadyFinished`
    /// if the run has already ended.
    pub async fn cancel(&self, id: Uuid) -> Result<(), RunError> {
        let runs = self.runs.lock().await;
        let entry = runs.get(&id).ok_or(RunError::NotFound(id))?;

        if entry.snapshot.status.is_finished() {
            return Err(RunError::AlreadyFinished(id));
        }

        info!(run_id = %id, "Cancelling run");
        entry.cancel.cancel();
        Ok(())
    }

    /// Cancel every run and wait for their tasks to wind down.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();

        let tasks: Vec<JoinHandle<()>> = {
            let mut runs = self.runs.lock().await;
            runs.values_mut().filter_map(|entry| entry.task.take()).collect()
        };

        info!(runs = tasks.len(), "Waiting for runs to stop");
        for task in tasks {
            let _ = task.await;
        }
    }

    /// Get the current state of a run.
    pub async fn snapshot(&self, id: Uuid) -> Option<RunSnapshot> {
        let runs = self.runs.lock().await;
        runs.get(&id).map(|entry| entry.snapshot.clone())
    }

    /// Get every known run, most recent first.
    pub async fn list(&self) -> Vec<RunSnapshot> {
        let runs = self.runs.lock().await;
        let mut result: Vec<RunSnapshot> =
            runs.values().map(|entry| entry.snapshot.clone()).collect();
        result.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        result
    }

    /// Forget runs that finished more than `older_than` ago.
    ///
    /// Returns the number of runs removed.
    pub async fn prune_finished(&self, older_than: Duration) -> usize {
        let cutoff = chrono::Duration::from_std(older_than)
            .ok()
            .and_then(|age| chrono::Utc::now().checked_sub_signed(age));
        let Some(cutoff) = cutoff else {
            return 0;
        };

        let mut runs = self.runs.lock().await;
        let before = runs.len();
        runs.retain(|_, entry| match entry.snapshot.finished_at {
            Some(finished_at) => finished_at > cutoff,
            None => true,
        });
        before - runs.len()
    }

    /// Get the number of known runs.
    pub async fn run_count(&self) -> usize {
        let runs = self.runs.lock().await;
        runs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::CapabilitySet;
    use crate::storage::{ArtifactStore, StorageArea};
    use rf_protocol::RunStatus;
    use tempfile::TempDir;

    fn create_test_manager(temp: &TempDir) -> RunManager {
        let artifacts = ArtifactStore::open(temp.path().join("outputs")).unwrap();
        let storage = StorageArea::new(Some(temp.path().join("work")), artifacts);
        let engine = PipelineEngine::new(CapabilitySet::mock(), storage);
        RunManager::new(Arc::new(engine), 16)
    }

    fn test_request() -> PipelineRequest {
        PipelineRequest::new("Script", "en-US-AriaNeural", Some("ocean".to_string()), None)
            .unwrap()
    }

    #[tokio::test]
    async fn test_run_manager_new() {
        let temp = TempDir::new().unwrap();
        let manager = create_test_manager(&temp);
        assert_eq!(manager.run_count().await, 0);
    }

    #[tokio::test]
    async fn test_run_manager_start_and_snapshot() {
        let temp = TempDir::new().unwrap();
        let manager = create_test_manager(&temp);

        let (id, rx) = manager.start(test_request()).await;
        assert!(manager.snapshot(id).await.is_some());

        let events = rx.collect().await;
        assert!(events.last().unwrap().is_terminal());

        let snapshot = manager.snapshot(id).await.unwrap();
        assert_eq!(snapshot.status, RunStatus::Completed);
        assert_eq!(snapshot.progress, 100);
        assert!(snapshot.video_id.is_some());
    }

    #[tokio::test]
    async fn test_run_manager_unknown_run() {
        let temp = TempDir::new().unwrap();
        let manager = create_test_manager(&temp);
        let id = Uuid::new_v4();

        assert!(manager.snapshot(id).await.is_none());
        assert_eq!(manager.cancel(id).await, Err(RunError::NotFound(id)));
    }

    #[tokio::test]
    async fn test_cancel_finished_run() {
        let temp = TempDir::new().unwrap();
        let manager = create_test_manager(&temp);

        let (id, rx) = manager.start(test_request()).await;
        rx.collect().await;

        assert_eq!(manager.cancel(id).await, Err(RunError::AlreadyFinished(id)));
    }

    #[tokio::test]
    async fn test_prune_finished() {
        let temp = TempDir::new().unwrap();
        let manager = create_test_manager(&temp);

        let (_, rx) = manager.start(test_request()).await;
        rx.collect().await;

        assert_eq!(manager.prune_finished(Duration::from_secs(3600)).await, 0);
        assert_eq!(manager.prune_finished(Duration::ZERO).await, 1);
        assert_eq!(manager.run_count().await, 0);
    }
}
