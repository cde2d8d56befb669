//! Test fixtures for building engines over mock capabilities.

use rf_core::capabilities::adapters::mock::{
    MockCompositor, MockTranscriber, MockVideoSource, MockVoiceover,
};
use rf_core::capabilities::CapabilitySet;
use rf_core::engine::PipelineEngine;
use rf_core::storage::{ArtifactStore, StorageArea};
use rf_protocol::{PipelineRequest, UploadedVideo};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Mock adapters plus the temporary directories they run in.
///
/// The mocks share their call logs with the copies inside the engine, so
/// tests can inspect them after a run.
pub struct TestHarness {
    pub temp: TempDir,
    pub voiceover: MockVoiceover,
    pub source: MockVideoSource,
    pub transcriber: MockTranscriber,
    pub compositor: MockCompositor,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_mocks(
            MockVoiceover::success(),
            MockVideoSource::success(),
            MockTranscriber::success(),
            MockCompositor::success(),
        )
    }

    pub fn with_mocks(
        voiceover: MockVoiceover,
        source: MockVideoSource,
        transcriber: MockTranscriber,
        compositor: MockCompositor,
    ) -> Self {
        Self {
            temp: tempfile::tempdir().expect("create temp dir"),
            voiceover,
            source,
            transcriber,
            compositor,
        }
    }

    pub fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::new(
            Arc::new(self.voiceover.clone()),
            Arc::new(self.source.clone()),
            Arc::new(self.transcriber.clone()),
            Arc::new(self.compositor.clone()),
        )
    }

    /// Parent of every working directory the engine allocates.
    pub fn work_root(&self) -> PathBuf {
        self.temp.path().join("work")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.temp.path().join("outputs")
    }

    pub fn storage(&self) -> StorageArea {
        let artifacts = ArtifactStore::open(self.output_dir()).expect("open artifact store");
        StorageArea::new(Some(self.work_root()), artifacts)
    }

    pub fn engine(&self) -> PipelineEngine {
        PipelineEngine::new(self.capabilities(), self.storage())
    }

    /// Number of working directories left behind.
    pub fn leftover_workspaces(&self) -> usize {
        std::fs::read_dir(self.work_root())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

pub fn query_request(query: &str) -> PipelineRequest {
    PipelineRequest::new(
        "Tide pools are small worlds.",
        "en-US-AriaNeural",
        Some(query.to_string()),
        None,
    )
    .expect("valid query request")
}

pub fn upload_request(bytes: &'static [u8]) -> PipelineRequest {
    PipelineRequest::new(
        "Tide pools are small worlds.",
        "en-US-AriaNeural",
        None,
        Some(UploadedVideo::new(Some("background.mp4".to_string()), bytes)),
    )
    .expect("valid upload request")
}
