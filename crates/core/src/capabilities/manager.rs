//! The set of capability adapters a pipeline runs against.

use crate::capabilities::adapters::{
    EdgeTtsVoiceover, FfmpegCompositor, MockCompositor, MockTranscriber, MockVideoSource,
    MockVoiceover, PexelsVideoSource, WhisperTranscriber,
};
use crate::capabilities::base::{CapabilityError, Compositor, Transcriber, VideoSource, Voiceover};
use rf_protocol::ServiceConfig;
use std::sync::Arc;
use tracing::warn;

/// One adapter per capability, shared across concurrent runs.
#[derive(Clone)]
pub struct CapabilitySet {
    pub voiceover: Arc<dyn Voiceover>,
    pub video_source: Arc<dyn VideoSource>,
    pub transcriber: Arc<dyn Transcriber>,
    pub compositor: Arc<dyn Compositor>,
}

impl CapabilitySet {
    pub fn new(
        voiceover: Arc<dyn Voiceover>,
        video_source: Arc<dyn VideoSource>,
        transcriber: Arc<dyn Transcriber>,
        compositor: Arc<dyn Compositor>,
    ) -> Self {
        Self {
            voiceover,
            video_source,
            transcriber,
            compositor,
        }
    }

    /// Build the real adapters from configuration.
    ///
    /// The Pexels key is taken from `config.pexels.api_key`; adapters never
    /// read the environment themselves.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, CapabilityError> {
        let tools = &config.tools;
        Ok(Self {
            voiceover: Arc::new(EdgeTtsVoiceover::new(&tools.edge_tts, &tools.ffprobe)),
            video_source: Arc::new(PexelsVideoSource::new(&config.pexels)?),
            transcriber: Arc::new(WhisperTranscriber::new(
                &tools.whisper,
                &tools.whisper_model,
            )),
            compositor: Arc::new(FfmpegCompositor::new(&tools.ffmpeg, &tools.ffprobe)),
        })
    }

    /// Mock adapters that succeed, for tests and dry runs.
    pub fn mock() -> Self {
        Self {
            voiceover: Arc::new(MockVoiceover::success()),
            video_source: Arc::new(MockVideoSource::success()),
            transcriber: Arc::new(MockTranscriber::success()),
            compositor: Arc::new(MockCompositor::success()),
        }
    }
}

/// External programs from `config` that cannot be found on `PATH`.
///
/// Missing tools are logged; runs still start and fail at the stage that
/// needs the tool.
pub fn missing_tools(config: &ServiceConfig) -> Vec<String> {
    let tools = &config.tools;
    let missing: Vec<String> = [&tools.ffmpeg, &tools.ffprobe, &tools.edge_tts, &tools.whisper]
        .into_iter()
        .filter(|program| which::which(program.as_str()).is_err())
        .cloned()
        .collect();

    for program in &missing {
        warn!(program = %program, "External tool not found on PATH");
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_builds_without_api_key() {
        let config = ServiceConfig::default();
        assert!(CapabilitySet::from_config(&config).is_ok());
    }

    #[test]
    fn test_missing_tools_reports_unknown_programs() {
        let mut config = ServiceConfig::default();
        config.tools.whisper = "nonexistent-whisper-xyz".to_string();

        let missing = missing_tools(&config);
        assert!(missing.contains(&"nonexistent-whisper-xyz".to_string()));
    }
}
