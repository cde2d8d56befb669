//! Progress events and their wire form.
//!
//! The core emits [`StageEvent`]s; transports serialize them through
//! [`WireEvent`], a flat JSON object:
//!
//! ```json
//! {"status": "Generating voiceover...", "progress": 10}
//! {"status": "Failed", "progress": 30, "error": "No videos found for that query."}
//! {"status": "Done", "progress": 100, "videoId": "0b6c...e1.mp4"}
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use crate::stage_models::Stage;

const ARTIFACT_EXTENSION: &str = ".mp4";

/// Status text carried by the error event.
pub const FAILED_STATUS: &str = "Failed";

/// Identifier of a published video, `<uuid-v4>.mp4`.
///
/// The only way to build one is [`ArtifactId::generate`] or a successful
/// [`ArtifactId::parse`], so an id can always be joined onto the output
/// directory without escaping it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactId(String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid artifact id: {0}")]
pub struct InvalidArtifactId(pub String);

impl ArtifactId {
    /// A fresh identifier from a random v4 UUID.
    pub fn generate() -> Self {
        Self(format!("{}{ARTIFACT_EXTENSION}", Uuid::new_v4()))
    }

    /// Parse a client-supplied identifier.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidArtifactId`] unless the value is a UUID followed by `.mp4`.
    pub fn parse(value: &str) -> Result<Self, InvalidArtifactId> {
        let stem = value
            .strip_suffix(ARTIFACT_EXTENSION)
            .ok_or_else(|| InvalidArtifactId(value.to_string()))?;
        let uuid = Uuid::parse_str(stem).map_err(|_| InvalidArtifactId(value.to_string()))?;
        // Normalise to the hyphenated lowercase form used on disk.
        Ok(Self(format!("{}{ARTIFACT_EXTENSION}", uuid.hyphenated())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ArtifactId {
    type Error = InvalidArtifactId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ArtifactId::parse(&value)
    }
}

impl From<ArtifactId> for String {
    fn from(id: ArtifactId) -> Self {
        id.0
    }
}

/// What an event means for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A stage has started; more events follow.
    InProgress,
    /// The run failed; this is the last event.
    Error { message: String },
    /// The run succeeded; this is the last event.
    Complete { video_id: ArtifactId },
}

/// One entry of a run's ordered progress feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageEvent {
    pub status: String,
    /// Percentage in `0..=100`.
    pub progress: u8,
    pub kind: EventKind,
}

impl StageEvent {
    /// The announcement emitted before `stage` begins.
    pub fn stage(stage: Stage) -> Self {
        Self {
            status: stage.status_text().to_string(),
            progress: stage.checkpoint(),
            kind: EventKind::InProgress,
        }
    }

    /// Terminal failure, reported at the last progress reached.
    pub fn error(progress: u8, message: impl Into<String>) -> Self {
        Self {
            status: FAILED_STATUS.to_string(),
            progress: progress.min(100),
            kind: EventKind::Error {
                message: message.into(),
            },
        }
    }

    /// Terminal success carrying the published artifact.
    pub fn complete(video_id: ArtifactId) -> Self {
        Self {
            status: Stage::Complete.status_text().to_string(),
            progress: Stage::Complete.checkpoint(),
            kind: EventKind::Complete { video_id },
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.kind, EventKind::InProgress)
    }

    pub fn video_id(&self) -> Option<&ArtifactId> {
        match &self.kind {
            EventKind::Complete { video_id } => Some(video_id),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Error { message } => Some(message),
            _ => None,
        }
    }

    pub fn to_wire(&self) -> WireEvent {
        WireEvent::from(self)
    }
}

/// JSON shape of a streamed event.
///
/// `error` is present only on failure and `videoId` only on success.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct WireEvent {
    pub status: String,
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub video_id: Option<String>,
}

impl From<&StageEvent> for WireEvent {
    fn from(event: &StageEvent) -> Self {
        Self {
            status: event.status.clone(),
            progress: event.progress,
            error: event.error_message().map(str::to_string),
            video_id: event.video_id().map(|id| id.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_id_roundtrip() {
        let id = ArtifactId::generate();
        assert!(id.as_str().ends_with(".mp4"));
        assert_eq!(ArtifactId::parse(id.as_str()).unwrap(), id);
    }

    #[test]
    fn test_artifact_id_rejects_traversal() {
        assert!(ArtifactId::parse("../etc/passwd").is_err());
        assert!(ArtifactId::parse("../../x.mp4").is_err());
        assert!(ArtifactId::parse("not-a-uuid.mp4").is_err());
        assert!(ArtifactId::parse("3f1c1b55-9a6e-4c38-b6c5-0d3e7e0a2f11").is_err());
    }

    #[test]
    fn test_artifact_id_normalises_case() {
        let id = ArtifactId::parse("3F1C1B55-9A6E-4C38-B6C5-0D3E7E0A2F11.mp4").unwrap();
        assert_eq!(id.as_str(), "3f1c1b55-9a6e-4c38-b6c5-0d3e7e0a2f11.mp4");
    }

    #[test]
    fn test_terminal_flags() {
        assert!(!StageEvent::stage(Stage::Voiceover).is_terminal());
        assert!(StageEvent::error(40, "boom").is_terminal());
        assert!(StageEvent::complete(ArtifactId::generate()).is_terminal());
    }

    #[test]
    fn test_error_progress_is_bounded() {
        assert_eq!(StageEvent::error(250, "boom").progress, 100);
    }
}
