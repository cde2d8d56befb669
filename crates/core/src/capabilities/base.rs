//! Capability traits and supporting types.
//!
//! Each trait wraps one slow, failure-prone external capability behind a
//! narrow contract. The engine only ever talks to these traits; real
//! adapters live in [`crate::capabilities::adapters`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Width of the 9:16 output frame, in pixels.
pub const TARGET_WIDTH: u32 = 1080;

/// Height of the 9:16 output frame, in pixels.
pub const TARGET_HEIGHT: u32 = 1920;

/// A synthesized voiceover track.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub path: PathBuf,
    /// Play duration of the track.
    pub duration: Duration,
}

/// A downloadable stock clip returned by a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipLink {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// One transcribed span of speech, times in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Whether `t` falls inside the half-open window `[start, end)`.
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Voiceover synthesis failed: {0}")]
    Synthesis(String),
    #[error("Video source request failed: {0}")]
    SourceFetch(String),
    #[error("Transcription failed: {0}")]
    Transcription(String),
    #[error("Video composition failed: {0}")]
    Composition(String),
}

/// Text-to-speech.
#[async_trait]
pub trait Voiceover: Send + Sync {
    /// Write a spoken rendition of `text` to `dest` and report its duration.
    ///
    /// Fails with `CapabilityError::Synthesis` on empty text or an
    /// unsupported voice.
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        dest: &Path,
    ) -> Result<SynthesizedAudio, CapabilityError>;
}

/// Stock-video catalog.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Find vertical clips to cover roughly `target_duration` of footage.
    ///
    /// An empty result means nothing matched; it is not an error here.
    async fn search(
        &self,
        query: &str,
        target_duration: Duration,
    ) -> Result<Vec<ClipLink>, CapabilityError>;

    /// Download one clip to `dest`.
    async fn download(&self, link: &ClipLink, dest: &Path) -> Result<PathBuf, CapabilityError>;
}

/// Speech-to-text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Time-ordered segments covering the whole track.
    async fn transcribe(&self, audio: &Path) -> Result<Vec<TranscriptSegment>, CapabilityError>;
}

/// Video assembly.
#[async_trait]
pub trait Compositor: Send + Sync {
    /// Join `videos` end to end, in the given order.
    async fn concatenate(&self, videos: &[PathBuf], dest: &Path)
        -> Result<PathBuf, CapabilityError>;

    /// Lay `audio` over `video`, fit the frame to 9:16 and cut the result to
    /// at most the audio's length.
    async fn compose(
        &self,
        video: &Path,
        audio: &Path,
        dest: &Path,
    ) -> Result<PathBuf, CapabilityError>;

    /// Render each segment on screen during its `[start, end)` window.
    async fn burn_subtitles(
        &self,
        video: &Path,
        segments: &[TranscriptSegment],
        dest: &Path,
    ) -> Result<PathBuf, CapabilityError>;
}

/// Number of clips needed to cover `target` with clips of `average` length.
///
/// Always at least one.
pub fn clip_count(target: Duration, average: Duration) -> usize {
    if average.is_zero() {
        return 1;
    }
    let count = (target.as_secs_f64() / average.as_secs_f64()).ceil();
    (count as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_count_exact_multiple() {
        assert_eq!(
            clip_count(Duration::from_secs(24), Duration::from_secs(8)),
            3
        );
    }

    #[test]
    fn test_clip_count_rounds_up() {
        assert_eq!(
            clip_count(Duration::from_secs_f64(24.2), Duration::from_secs(8)),
            4
        );
        assert_eq!(clip_count(Duration::from_secs(1), Duration::from_secs(8)), 1);
    }

    #[test]
    fn test_clip_count_never_zero() {
        assert_eq!(clip_count(Duration::ZERO, Duration::from_secs(8)), 1);
        assert_eq!(clip_count(Duration::from_secs(30), Duration::ZERO), 1);
    }

    #[test]
    fn test_segment_window_is_half_open() {
        let segment = TranscriptSegment::new(1.0, 2.5, "hello");
        assert!(segment.contains(1.0));
        assert!(segment.contains(2.4));
        assert!(!segment.contains(2.5));
        assert!(!segment.contains(0.99));
    }
}
