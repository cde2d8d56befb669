//! Transcription through the `whisper` command-line tool.
//!
//! Whisper is asked for JSON output next to the audio file; only the
//! `segments` array of that document is read.

use crate::capabilities::base::{CapabilityError, Transcriber, TranscriptSegment};
use crate::capabilities::runner::CommandRunner;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
}

pub struct WhisperTranscriber {
    program: String,
    model: String,
}

impl WhisperTranscriber {
    pub fn new(program: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            model: model.into(),
        }
    }

    fn build_args(&self, audio: &Path, output_dir: &Path) -> Vec<String> {
        vec![
            audio.to_string_lossy().into_owned(),
            "--model".to_string(),
            self.model.clone(),
            "--fp16".to_string(),
            "False".to_string(),
            "--output_format".to_string(),
            "json".to_string(),
            "--output_dir".to_string(),
            output_dir.to_string_lossy().into_owned(),
            "--verbose".to_string(),
            "False".to_string(),
        ]
    }

    /// Where whisper writes the JSON transcript for `audio`.
    fn output_path(audio: &Path, output_dir: &Path) -> Result<PathBuf, CapabilityError> {
        let stem = audio.file_stem().ok_or_else(|| {
            CapabilityError::Transcription(format!("Invalid audio path: {}", audio.display()))
        })?;
        let mut name = stem.to_os_string();
        name.push(".json");
        Ok(output_dir.join(name))
    }
}

fn parse_segments(json: &str) -> Result<Vec<TranscriptSegment>, CapabilityError> {
    let output: WhisperOutput = serde_json::from_str(json)
        .map_err(|e| CapabilityError::Transcription(format!("Malformed whisper output: {e}")))?;

    let mut segments: Vec<TranscriptSegment> = output
        .segments
        .into_iter()
        .map(|s| TranscriptSegment::new(s.start, s.end, s.text.trim()))
        .collect();
    segments.sort_by(|a, b| a.start.total_cmp(&b.start));
    Ok(segments)
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<Vec<TranscriptSegment>, CapabilityError> {
        if !tokio::fs::try_exists(audio).await.unwrap_or(false) {
            return Err(CapabilityError::Transcription(format!(
                "Audio not found: {}",
                audio.display()
            )));
        }

        let output_dir = audio
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let json_path = Self::output_path(audio, &output_dir)?;

        debug!(model = %self.model, audio = %audio.display(), "Transcribing audio");
        CommandRunner::run(&self.program, self.build_args(audio, &output_dir), None)
            .await
            .map_err(|e| CapabilityError::Transcription(e.to_string()))?;

        let json = tokio::fs::read_to_string(&json_path).await.map_err(|e| {
            CapabilityError::Transcription(format!("{}: {e}", json_path.display()))
        })?;
        parse_segments(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args_uses_model_and_fp32() {
        let transcriber = WhisperTranscriber::new("whisper", "tiny");
        let args = transcriber.build_args(Path::new("/w/voice.mp3"), Path::new("/w"));

        assert_eq!(args[0], "/w/voice.mp3");
        assert!(args.windows(2).any(|w| w == ["--model", "tiny"]));
        assert!(args.windows(2).any(|w| w == ["--fp16", "False"]));
        assert!(args.windows(2).any(|w| w == ["--output_format", "json"]));
    }

    #[test]
    fn test_output_path() {
        let path =
            WhisperTranscriber::output_path(Path::new("/w/voice.mp3"), Path::new("/w")).unwrap();
        assert_eq!(path, PathBuf::from("/w/voice.json"));
    }

    #[test]
    fn test_parse_segments() {
        let json = r#"{
            "text": " Hello there. General Kenobi.",
            "segments": [
                {"id": 1, "start": 1.5, "end": 3.0, "text": " General Kenobi."},
                {"id": 0, "start": 0.0, "end": 1.5, "text": " Hello there."}
            ],
            "language": "en"
        }"#;

        let segments = parse_segments(json).unwrap();
        assert_eq!(
            segments,
            vec![
                TranscriptSegment::new(0.0, 1.5, "Hello there."),
                TranscriptSegment::new(1.5, 3.0, "General Kenobi."),
            ]
        );
    }

    #[test]
    fn test_parse_segments_malformed() {
        assert!(matches!(
            parse_segments("not json"),
            Err(CapabilityError::Transcription(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_audio() {
        let transcriber = WhisperTranscriber::new("whisper", "tiny");
        let result = transcriber
            .transcribe(Path::new("/nonexistent/voice.mp3"))
            .await;
        assert!(matches!(result, Err(CapabilityError::Transcription(_))));
    }
}
