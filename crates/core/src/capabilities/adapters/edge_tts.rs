//! Voiceover through the `edge-tts` command-line tool.

use crate::capabilities::adapters::ffmpeg::probe_duration;
use crate::capabilities::base::{CapabilityError, SynthesizedAudio, Voiceover};
use crate::capabilities::runner::CommandRunner;
use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

pub struct EdgeTtsVoiceover {
    program: String,
    ffprobe: String,
}

impl EdgeTtsVoiceover {
    pub fn new(program: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ffprobe: ffprobe.into(),
        }
    }

    fn build_args(voice_id: &str, text_file: &Path, dest: &Path) -> Vec<String> {
        vec![
            "--voice".to_string(),
            voice_id.to_string(),
            "--file".to_string(),
            text_file.to_string_lossy().into_owned(),
            "--write-media".to_string(),
            dest.to_string_lossy().into_owned(),
        ]
    }
}

#[async_trait]
impl Voiceover for EdgeTtsVoiceover {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        dest: &Path,
    ) -> Result<SynthesizedAudio, CapabilityError> {
        if text.trim().is_empty() {
            return Err(CapabilityError::Synthesis("No text to speak".to_string()));
        }
        if voice_id.trim().is_empty() {
            return Err(CapabilityError::Synthesis("No voice selected".to_string()));
        }

        // Scripts can exceed the per-argument length limit, so the text is
        // handed over in a file.
        let text_file = dest.with_extension("txt");
        tokio::fs::write(&text_file, text)
            .await
            .map_err(|e| CapabilityError::Synthesis(e.to_string()))?;

        debug!(voice_id, chars = text.len(), "Synthesizing voiceover");
        CommandRunner::run(
            &self.program,
            Self::build_args(voice_id, &text_file, dest),
            None,
        )
        .await
        .map_err(|e| CapabilityError::Synthesis(e.to_string()))?;

        let duration = probe_duration(&self.ffprobe, dest)
            .await
            .map_err(CapabilityError::Synthesis)?;

        Ok(SynthesizedAudio {
            path: dest.to_path_buf(),
            duration,
        })
    }
}
