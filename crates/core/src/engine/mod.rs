//! Pipeline execution engine.
//!
//! The PipelineEngine runs one request through the fixed stage schedule,
//! reporting each stage on the run's progress feed and leaving exactly one
//! published artifact or one error behind.

use crate::capabilities::{CapabilitySet, TranscriptSegment};
use crate::error::PipelineError;
use crate::progress::ProgressSender;
use crate::storage::{StorageArea, WorkingState};
use crate::subtitles::{normalize_segments, write_srt};
use futures::future::try_join_all;
use rf_protocol::{ArtifactId, PipelineRequest, SourceMode, Stage};
use std::future::Future;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The main pipeline execution engine.
///
/// The engine is stateless between runs; it is shared behind an `Arc` and
/// every call to [`PipelineEngine::run`] gets its own working directory.
pub struct PipelineEngine {
    capabilities: CapabilitySet,
    storage: StorageArea,
}

impl PipelineEngine {
    /// Create a new PipelineEngine.
    ///
    /// # Arguments
    ///
    /// * `capabilities` - Adapters for speech, footage, transcription and composition
    /// * `storage` - Allocator for working directories and the artifact store
    pub fn new(capabilities: CapabilitySet, storage: StorageArea) -> Self {
        Self {
            capabilities,
            storage,
        }
    }

    pub fn storage(&self) -> &StorageArea {
        &self.storage
    }

    /// Execute one pipeline run.
    ///
    /// This is the main entry point for pipeline execution. It:
    /// 1. Allocates a fresh working directory
    /// 2. Runs voiceover, source acquisition, subtitle generation,
    ///    composition and subtitle burn-in, announcing each on `progress`
    /// 3. Publishes the final video to the artifact store
    /// 4. Disposes the working directory
    /// 5. Emits exactly one terminal event: `Complete` with the artifact id,
    ///    or an error carrying the failure message
    ///
    /// Every stage is raced against `cancel`; a cancelled run takes the same
    /// cleanup path as a failed one.
    ///
    /// # Arguments
    ///
    /// * `request` - A validated request
    /// * `progress` - The run's progress feed; consumed so nothing can be
    ///   emitted after the terminal event
    /// * `cancel` - Cancellation signal for this run
    ///
    /// # Errors
    ///
    /// Returns the `PipelineError` that ended the run. It has already been
    /// reported on `progress` when this returns.
    pub async fn run(
        &self,
        request: PipelineRequest,
        mut progress: ProgressSender,
        cancel: CancellationToken,
    ) -> Result<ArtifactId, PipelineError> {
        let workspace = match self.storage.create().await {
            Ok(workspace) => workspace,
            Err(e) => {
                let err = PipelineError::from(e);
                warn!(error = %err, "Failed to allocate working directory");
                progress.fail(err.to_string());
                return Err(err);
            }
        };

        let result = self
            .execute(&request, &workspace, &mut progress, &cancel)
            .await;

        // Intermediates are gone before the terminal event is emitted.
        if let Err(e) = workspace.dispose().await {
            warn!(error = %e, "Failed to remove working directory");
        }

        match result {
            Ok(video_id) => {
                info!(video_id = %video_id, "Pipeline completed");
                progress.complete(video_id.clone());
                Ok(video_id)
            }
            Err(err) => {
                match &err {
                    PipelineError::Cancelled => info!("Pipeline cancelled"),
                    _ => warn!(kind = err.kind(), error = %err, "Pipeline failed"),
                }
                progress.fail(err.to_string());
                Err(err)
            }
        }
    }

    /// Run every stage against `workspace` and publish the result.
    async fn execute(
        &self,
        request: &PipelineRequest,
        workspace: &WorkingState,
        progress: &mut ProgressSender,
        cancel: &CancellationToken,
    ) -> Result<ArtifactId, PipelineError> {
        let caps = &self.capabilities;

        enter(progress, cancel, Stage::Voiceover)?;
        let audio = guarded(cancel, async {
            caps.voiceover
                .synthesize(&request.script, &request.voice_id, &workspace.audio_path())
                .await
                .map_err(PipelineError::from)
        })
        .await?;
        debug!(secs = audio.duration.as_secs_f64(), "Voiceover ready");

        enter(progress, cancel, Stage::SourceSearch)?;
        let background = self
            .acquire_background(request, workspace, progress, cancel, &audio)
            .await?;

        enter(progress, cancel, Stage::SubtitleGeneration)?;
        let segments = self.generate_subtitles(workspace, cancel, &audio.path).await?;

        enter(progress, cancel, Stage::Composition)?;
        let composed = guarded(cancel, async {
            caps.compositor
                .compose(&background, &audio.path, &workspace.composed_path())
                .await
                .map_err(PipelineError::from)
        })
        .await?;

        enter(progress, cancel, Stage::SubtitleBurn)?;
        let final_video = guarded(cancel, async {
            caps.compositor
                .burn_subtitles(&composed, &segments, &workspace.final_path())
                .await
                .map_err(PipelineError::from)
        })
        .await?;

        // Publishing commits the run and is never raced against cancellation.
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        self.storage
            .publish(&final_video)
            .await
            .map_err(PipelineError::from)
    }

    /// Produce the background video at `background.mp4` or a downloaded clip.
    ///
    /// Query mode searches for enough clips to cover the voiceover, downloads
    /// them concurrently and joins them in search order. Upload mode writes
    /// the uploaded bytes without touching the network.
    async fn acquire_background(
        &self,
        request: &PipelineRequest,
        workspace: &WorkingState,
        progress: &mut ProgressSender,
        cancel: &CancellationToken,
        audio: &crate::capabilities::SynthesizedAudio,
    ) -> Result<PathBuf, PipelineError> {
        let caps = &self.capabilities;

        let query = match &request.source {
            SourceMode::UploadedVideo(upload) => {
                let dest = workspace.background_path();
                guarded(cancel, async {
                    workspace
                        .write_file(&dest, &upload.bytes)
                        .await
                        .map_err(PipelineError::from)
                })
                .await?;
                debug!(bytes = upload.bytes.len(), "Using uploaded background video");
                return Ok(dest);
            }
            SourceMode::Query(query) => query,
        };

        let links = guarded(cancel, async {
            caps.video_source
                .search(query, audio.duration)
                .await
                .map_err(PipelineError::from)
        })
        .await?;

        if links.is_empty() {
            return Err(PipelineError::NoContentFound);
        }
        info!(query = %query, clips = links.len(), "Found background clips");

        enter(progress, cancel, Stage::SourceDownload)?;
        let downloads = links.iter().enumerate().map(|(index, link)| {
            let dest = workspace.clip_path(index);
            async move { caps.video_source.download(link, &dest).await }
        });
        let clips = guarded(cancel, async {
            try_join_all(downloads).await.map_err(PipelineError::from)
        })
        .await?;

        if let [single] = clips.as_slice() {
            return Ok(single.clone());
        }

        enter(progress, cancel, Stage::SourceConcatenate)?;
        guarded(cancel, async {
            caps.compositor
                .concatenate(&clips, &workspace.background_path())
                .await
                .map_err(PipelineError::from)
        })
        .await
    }

    /// Transcribe the voiceover and write the SRT transcript.
    async fn generate_subtitles(
        &self,
        workspace: &WorkingState,
        cancel: &CancellationToken,
        audio: &std::path::Path,
    ) -> Result<Vec<TranscriptSegment>, PipelineError> {
        let raw = guarded(cancel, async {
            self.capabilities
                .transcriber
                .transcribe(audio)
                .await
                .map_err(PipelineError::from)
        })
        .await?;

        let segments = normalize_segments(&raw);
        let srt_path = workspace.srt_path();
        write_srt(&srt_path, &segments).await.map_err(|source| {
            PipelineError::Storage(crate::storage::StorageError::Write {
                path: srt_path.clone(),
                source,
            })
        })?;

        debug!(segments = segments.len(), "Subtitles written");
        Ok(segments)
    }
}

/// Announce `stage`, unless the run was cancelled in the meantime.
fn enter(
    progress: &mut ProgressSender,
    cancel: &CancellationToken,
    stage: Stage,
) -> Result<(), PipelineError> {
    if cancel.is_cancelled() {
        return Err(PipelineError::Cancelled);
    }
    info!(stage = stage.name(), "Stage started");
    progress.stage(stage);
    Ok(())
}

/// Race `fut` against cancellation. Dropping the losing future also kills
/// any subprocess it was waiting on.
async fn guarded<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, PipelineError>
where
    F: Future<Output = Result<T, PipelineError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PipelineError::Cancelled),
        result = fut => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::adapters::mock::{MockMedia, MockVideoSource, MockVoiceover};
    use crate::progress::progress_channel;
    use crate::storage::ArtifactStore;
    use rf_protocol::EventKind;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn create_test_engine(temp: &TempDir, capabilities: CapabilitySet) -> PipelineEngine {
        let artifacts = ArtifactStore::open(temp.path().join("outputs")).unwrap();
        let storage = StorageArea::new(Some(temp.path().join("work")), artifacts);
        PipelineEngine::new(capabilities, storage)
    }

    fn query_request(query: &str) -> PipelineRequest {
        PipelineRequest::new("A short script.", "en-US-AriaNeural", Some(query.to_string()), None)
            .unwrap()
    }

    #[tokio::test]
    async fn test_engine_simple_execution() {
        let temp = TempDir::new().unwrap();
        let engine = create_test_engine(&temp, CapabilitySet::mock());
        let (tx, rx) = progress_channel(16);

        let video_id = engine
            .run(query_request("ocean"), tx, CancellationToken::new())
            .await
            .unwrap();

        let events = rx.collect().await;
        let last = events.last().unwrap();
        assert_eq!(last.kind, EventKind::Complete { video_id: video_id.clone() });
        assert!(engine.storage().artifacts().get(video_id.as_str()).await.is_ok());
    }

    #[tokio::test]
    async fn test_engine_single_clip_skips_concatenation() {
        let temp = TempDir::new().unwrap();
        let mut caps = CapabilitySet::mock();
        caps.voiceover = Arc::new(MockVoiceover::new(Duration::from_secs(5)));
        let engine = create_test_engine(&temp, caps);
        let (tx, rx) = progress_channel(16);

        let video_id = engine
            .run(query_request("ocean"), tx, CancellationToken::new())
            .await
            .unwrap();

        let stages: Vec<u8> = rx.collect().await.iter().map(|e| e.progress).collect();
        assert_eq!(stages, vec![10, 30, 40, 60, 80, 90, 100]);

        let path = engine.storage().artifacts().get(video_id.as_str()).await.unwrap();
        let media = MockMedia::read(&path).await.unwrap();
        assert_eq!(media.duration_secs, 5.0);
    }

    #[tokio::test]
    async fn test_engine_no_content_found() {
        let temp = TempDir::new().unwrap();
        let mut caps = CapabilitySet::mock();
        caps.video_source = Arc::new(MockVideoSource::empty());
        let engine = create_test_engine(&temp, caps);
        let (tx, rx) = progress_channel(16);

        let result = engine
            .run(query_request("zzzz"), tx, CancellationToken::new())
            .await;
        assert!(matches!(result, Err(PipelineError::NoContentFound)));

        let events = rx.collect().await;
        let last = events.last().unwrap();
        assert_eq!(last.error_message(), Some("No videos found for that query."));
        assert_eq!(last.progress, 30);
    }

    #[tokio::test]
    async fn test_engine_cancelled_before_start() {
        let temp = TempDir::new().unwrap();
        let engine = create_test_engine(&temp, CapabilitySet::mock());
        let (tx, rx) = progress_channel(16);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = engine.run(query_request("ocean"), tx, cancel).await;
        assert!(matches!(result, Err(PipelineError::Cancelled)));

        let events = rx.collect().await;
        assert_eq!(events.len(), 1);
        assert!(events[0].is_terminal());
    }
}
