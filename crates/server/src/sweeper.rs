//! Background removal of expired artifacts and finished runs.

use rf_core::state::RunManager;
use rf_core::storage::ArtifactStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Every `interval`, forget runs finished more than `run_retention` ago
/// and, when `artifact_ttl` is set, delete artifacts older than it.
///
/// Stops when `cancel` fires.
pub fn spawn_sweeper(
    artifacts: ArtifactStore,
    artifact_ttl: Option<Duration>,
    runs: Arc<RunManager>,
    run_retention: Duration,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if let Some(ttl) = artifact_ttl {
                let store = artifacts.clone();
                match tokio::task::spawn_blocking(move || store.sweep_expired(ttl)).await {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => warn!(error = %e, "Artifact sweep failed"),
                    Err(e) => warn!(error = %e, "Artifact sweep task panicked"),
                }
            }

            let pruned = runs.prune_finished(run_retention).await;
            if pruned > 0 {
                debug!(pruned, "Forgot finished runs");
            }
        }
        debug!("Sweeper stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_core::capabilities::CapabilitySet;
    use rf_core::engine::PipelineEngine;
    use rf_core::storage::StorageArea;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sweeper_removes_expired_and_stops() {
        let temp = TempDir::new().unwrap();
        let artifacts = ArtifactStore::open(temp.path().join("outputs")).unwrap();
        let stale = temp.path().join("outputs/6a1f2c3d-4b5e-4f60-8a9b-0c1d2e3f4a5b.mp4");
        std::fs::write(&stale, b"old").unwrap();

        let storage = StorageArea::new(Some(temp.path().join("work")), artifacts.clone());
        let engine = PipelineEngine::new(CapabilitySet::mock(), storage);
        let runs = Arc::new(RunManager::new(Arc::new(engine), 16));

        let cancel = CancellationToken::new();
        let handle = spawn_sweeper(
            artifacts,
            Some(Duration::ZERO),
            runs,
            Duration::from_secs(3600),
            Duration::from_millis(10),
            cancel.clone(),
        );

        let start = tokio::time::Instant::now();
        while stale.exists() && start.elapsed() < Duration::from_secs(5) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!stale.exists());

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_sweeper_prunes_runs_without_artifact_ttl() {
        let temp = TempDir::new().unwrap();
        let artifacts = ArtifactStore::open(temp.path().join("outputs")).unwrap();
        let storage = StorageArea::new(Some(temp.path().join("work")), artifacts.clone());
        let engine = PipelineEngine::new(CapabilitySet::mock(), storage);
        let runs = Arc::new(RunManager::new(Arc::new(engine), 16));

        let request = rf_protocol::PipelineRequest::new(
            "A short script.",
            "en-US-AriaNeural",
            Some("ocean".to_string()),
            None,
        )
        .unwrap();
        let (_, progress) = runs.start(request).await;
        let events = progress.collect().await;
        let video_id = events.last().and_then(|e| e.video_id()).cloned().unwrap();
        assert_eq!(runs.run_count().await, 1);

        let cancel = CancellationToken::new();
        let handle = spawn_sweeper(
            artifacts.clone(),
            None,
            Arc::clone(&runs),
            Duration::ZERO,
            Duration::from_millis(10),
            cancel.clone(),
        );

        let start = tokio::time::Instant::now();
        while runs.run_count().await > 0 && start.elapsed() < Duration::from_secs(5) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(runs.run_count().await, 0);
        assert!(artifacts.get(video_id.as_str()).await.is_ok());

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
