//! Pipeline submission models.
//!
//! A [`PipelineRequest`] can only be obtained through [`PipelineRequest::new`],
//! so every request that reaches the engine already carries exactly one
//! background video source.

use bytes::Bytes;
use thiserror::Error;

/// A reference video uploaded alongside the script.
#[derive(Debug, Clone)]
pub struct UploadedVideo {
    /// Original file name as reported by the client, if any.
    pub file_name: Option<String>,
    /// Raw file content.
    pub bytes: Bytes,
}

impl UploadedVideo {
    pub fn new(file_name: Option<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name,
            bytes: bytes.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Where the background footage comes from.
#[derive(Debug, Clone)]
pub enum SourceMode {
    /// Search the stock-video catalog for clips matching this query.
    Query(String),

    /// Use the uploaded file as the background video, no network I/O.
    UploadedVideo(UploadedVideo),
}

impl SourceMode {
    pub fn is_query(&self) -> bool {
        matches!(self, SourceMode::Query(_))
    }
}

/// Reasons a submission is rejected before any pipeline work starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("A non-empty script must be provided.")]
    EmptyScript,
    #[error("A voice must be provided.")]
    MissingVoice,
    #[error("Either a video query or a video file must be provided.")]
    MissingSource,
    #[error("Provide either a video query or a video file, not both.")]
    AmbiguousSource,
}

/// Immutable input of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    /// Text narrated by the voiceover.
    pub script: String,
    /// Voice identifier understood by the voiceover capability.
    pub voice_id: String,
    /// Background video source.
    pub source: SourceMode,
}

impl PipelineRequest {
    /// Validate raw submission fields into a request.
    ///
    /// A blank query and a zero-length upload count as absent. Exactly one
    /// source must remain.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] describing the first problem found.
    pub fn new(
        script: impl Into<String>,
        voice: impl Into<String>,
        video_query: Option<String>,
        video_file: Option<UploadedVideo>,
    ) -> Result<Self, ValidationError> {
        let script = script.into();
        if script.trim().is_empty() {
            return Err(ValidationError::EmptyScript);
        }

        let voice_id = voice.into().trim().to_string();
        if voice_id.is_empty() {
            return Err(ValidationError::MissingVoice);
        }

        let query = video_query
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());
        let upload = video_file.filter(|f| !f.is_empty());

        let source = match (query, upload) {
            (Some(query), None) => SourceMode::Query(query),
            (None, Some(upload)) => SourceMode::UploadedVideo(upload),
            (Some(_), Some(_)) => return Err(ValidationError::AmbiguousSource),
            (None, None) => return Err(ValidationError::MissingSource),
        };

        Ok(Self {
            script,
            voice_id,
            source,
        })
    }
}
