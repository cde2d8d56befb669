//! Mock capability adapters for testing.
//!
//! Instead of real media, every mock writes a small JSON [`MockMedia`]
//! descriptor. Durations and clip order flow through the descriptors, so a
//! test can check truncation and concatenation order by reading the final
//! artifact back.

use crate::capabilities::base::{
    clip_count, CapabilityError, ClipLink, Compositor, SynthesizedAudio, Transcriber,
    TranscriptSegment, VideoSource, Voiceover, TARGET_HEIGHT, TARGET_WIDTH,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Length assumed for an uploaded file that is not a mock descriptor.
pub const OPAQUE_VIDEO_SECS: f64 = 60.0;

/// Stand-in for a media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockMedia {
    pub kind: String,
    pub duration_secs: f64,
    /// Clip URLs in playback order.
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub subtitles: Vec<TranscriptSegment>,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

impl MockMedia {
    pub fn new(kind: &str, duration_secs: f64) -> Self {
        Self {
            kind: kind.to_string(),
            duration_secs,
            sources: Vec::new(),
            subtitles: Vec::new(),
            width: 0,
            height: 0,
        }
    }

    /// Read a descriptor; any other readable file counts as an opaque video.
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            let mut media = Self::new("video", OPAQUE_VIDEO_SECS);
            media.sources.push(path.display().to_string());
            media
        }))
    }

    pub async fn write(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_vec_pretty(self).map_err(std::io::Error::other)?;
        tokio::fs::write(path, json).await
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Clone)]
pub struct MockVoiceover {
    duration: Duration,
    delay: Duration,
    fail: bool,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockVoiceover {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            delay: Duration::ZERO,
            fail: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn success() -> Self {
        Self::new(Duration::from_secs(24))
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::success()
        }
    }

    /// Sleep this long before producing audio.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// `(text, voice_id)` for every call so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl Voiceover for MockVoiceover {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        dest: &Path,
    ) -> Result<SynthesizedAudio, CapabilityError> {
        lock(&self.calls).push((text.to_string(), voice_id.to_string()));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if text.trim().is_empty() {
            return Err(CapabilityError::Synthesis("No text to speak".to_string()));
        }
        if self.fail {
            return Err(CapabilityError::Synthesis("Mock voiceover failure".to_string()));
        }

        MockMedia::new("audio", self.duration.as_secs_f64())
            .write(dest)
            .await
            .map_err(|e| CapabilityError::Synthesis(e.to_string()))?;

        Ok(SynthesizedAudio {
            path: dest.to_path_buf(),
            duration: self.duration,
        })
    }
}

#[derive(Clone)]
pub struct MockVideoSource {
    available: usize,
    clip_duration: Duration,
    average_clip: Duration,
    fail_search: bool,
    fail_download: bool,
    searches: Arc<Mutex<Vec<(String, usize)>>>,
    downloads: Arc<Mutex<Vec<String>>>,
}

impl MockVideoSource {
    /// A catalog holding `available` matching clips of `clip_duration` each.
    pub fn new(available: usize, clip_duration: Duration) -> Self {
        Self {
            available,
            clip_duration,
            average_clip: Duration::from_secs(8),
            fail_search: false,
            fail_download: false,
            searches: Arc::new(Mutex::new(Vec::new())),
            downloads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn success() -> Self {
        Self::new(10, Duration::from_secs(8))
    }

    /// A catalog with no matches for any query.
    pub fn empty() -> Self {
        Self::new(0, Duration::from_secs(8))
    }

    pub fn failing_search() -> Self {
        Self {
            fail_search: true,
            ..Self::success()
        }
    }

    pub fn failing_download() -> Self {
        Self {
            fail_download: true,
            ..Self::success()
        }
    }

    /// `(query, clips requested)` for every search so far.
    pub fn searches(&self) -> Vec<(String, usize)> {
        lock(&self.searches).clone()
    }

    pub fn downloads(&self) -> Vec<String> {
        lock(&self.downloads).clone()
    }

    fn link(index: usize) -> ClipLink {
        ClipLink {
            url: format!("mock://clips/{index}.mp4"),
            width: TARGET_WIDTH,
            height: TARGET_HEIGHT,
        }
    }
}

#[async_trait]
impl VideoSource for MockVideoSource {
    async fn search(
        &self,
        query: &str,
        target_duration: Duration,
    ) -> Result<Vec<ClipLink>, CapabilityError> {
        let requested = clip_count(target_duration, self.average_clip);
        lock(&self.searches).push((query.to_string(), requested));

        if self.fail_search {
            return Err(CapabilityError::SourceFetch(
                "Mock search failure".to_string(),
            ));
        }

        Ok((0..requested.min(self.available)).map(Self::link).collect())
    }

    async fn download(&self, link: &ClipLink, dest: &Path) -> Result<PathBuf, CapabilityError> {
        lock(&self.downloads).push(link.url.clone());

        if self.fail_download {
            return Err(CapabilityError::SourceFetch(format!(
                "Mock download failure for {}",
                link.url
            )));
        }

        let mut media = MockMedia::new("video", self.clip_duration.as_secs_f64());
        media.sources.push(link.url.clone());
        media.width = link.width;
        media.height = link.height;
        media
            .write(dest)
            .await
            .map_err(|e| CapabilityError::SourceFetch(e.to_string()))?;

        Ok(dest.to_path_buf())
    }
}

#[derive(Clone)]
pub struct MockTranscriber {
    segments: Vec<TranscriptSegment>,
    fail: bool,
}

impl MockTranscriber {
    pub fn new(segments: Vec<TranscriptSegment>) -> Self {
        Self {
            segments,
            fail: false,
        }
    }

    pub fn success() -> Self {
        Self::new(vec![
            TranscriptSegment::new(0.0, 2.5, "Welcome to the show."),
            TranscriptSegment::new(2.5, 6.0, "Today we look at tide pools."),
        ])
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::success()
        }
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<Vec<TranscriptSegment>, CapabilityError> {
        if self.fail {
            return Err(CapabilityError::Transcription(
                "Mock transcription failure".to_string(),
            ));
        }
        if !tokio::fs::try_exists(audio).await.unwrap_or(false) {
            return Err(CapabilityError::Transcription(format!(
                "Audio not found: {}",
                audio.display()
            )));
        }
        Ok(self.segments.clone())
    }
}

/// Compositor operation a [`MockCompositor`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositorStep {
    Concatenate,
    Compose,
    BurnSubtitles,
}

#[derive(Clone, Default)]
pub struct MockCompositor {
    fail_at: Option<CompositorStep>,
    calls: Arc<Mutex<Vec<CompositorStep>>>,
    concatenated: Arc<Mutex<Vec<Vec<PathBuf>>>>,
}

impl MockCompositor {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn failing_at(step: CompositorStep) -> Self {
        Self {
            fail_at: Some(step),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<CompositorStep> {
        lock(&self.calls).clone()
    }

    /// Input lists passed to every `concatenate` call.
    pub fn concatenated(&self) -> Vec<Vec<PathBuf>> {
        lock(&self.concatenated).clone()
    }

    fn enter(&self, step: CompositorStep) -> Result<(), CapabilityError> {
        lock(&self.calls).push(step);
        if self.fail_at == Some(step) {
            return Err(CapabilityError::Composition(format!(
                "Mock {step:?} failure"
            )));
        }
        Ok(())
    }
}

async fn read_media(path: &Path) -> Result<MockMedia, CapabilityError> {
    MockMedia::read(path)
        .await
        .map_err(|e| CapabilityError::Composition(format!("{}: {e}", path.display())))
}

async fn write_media(media: &MockMedia, dest: &Path) -> Result<PathBuf, CapabilityError> {
    media
        .write(dest)
        .await
        .map_err(|e| CapabilityError::Composition(e.to_string()))?;
    Ok(dest.to_path_buf())
}

#[async_trait]
impl Compositor for MockCompositor {
    async fn concatenate(
        &self,
        videos: &[PathBuf],
        dest: &Path,
    ) -> Result<PathBuf, CapabilityError> {
        self.enter(CompositorStep::Concatenate)?;
        lock(&self.concatenated).push(videos.to_vec());

        if videos.is_empty() {
            return Err(CapabilityError::Composition(
                "No videos to concatenate".to_string(),
            ));
        }

        let mut joined = MockMedia::new("video", 0.0);
        for video in videos {
            let media = read_media(video).await?;
            joined.duration_secs += media.duration_secs;
            joined.sources.extend(media.sources);
        }
        write_media(&joined, dest).await
    }

    async fn compose(
        &self,
        video: &Path,
        audio: &Path,
        dest: &Path,
    ) -> Result<PathBuf, CapabilityError> {
        self.enter(CompositorStep::Compose)?;

        let background = read_media(video).await?;
        let voice = read_media(audio).await?;

        let mut composed = MockMedia::new(
            "composed",
            background.duration_secs.min(voice.duration_secs),
        );
        composed.sources = background.sources;
        composed.width = TARGET_WIDTH;
        composed.height = TARGET_HEIGHT;
        write_media(&composed, dest).await
    }

    async fn burn_subtitles(
        &self,
        video: &Path,
        segments: &[TranscriptSegment],
        dest: &Path,
    ) -> Result<PathBuf, CapabilityError> {
        self.enter(CompositorStep::BurnSubtitles)?;

        let mut media = read_media(video).await?;
        media.kind = "final".to_string();
        media.subtitles = segments.to_vec();
        write_media(&media, dest).await
    }
}
