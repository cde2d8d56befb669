//! Pipeline failure taxonomy.
//!
//! Every failing run ends with exactly one of these. Its `Display` text is
//! what the client sees in the terminal error event.

use crate::capabilities::CapabilityError;
use crate::storage::StorageError;
use rf_protocol::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to fetch background video: {0}")]
    SourceFetch(String),

    #[error("No videos found for that query.")]
    NoContentFound,

    #[error("Voiceover generation failed: {0}")]
    Synthesis(String),

    #[error("Subtitle generation failed: {0}")]
    Transcription(String),

    #[error("Video composition failed: {0}")]
    Composition(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Pipeline cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Short machine-readable name, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validation",
            PipelineError::Configuration(_) => "configuration",
            PipelineError::SourceFetch(_) => "source_fetch",
            PipelineError::NoContentFound => "no_content_found",
            PipelineError::Synthesis(_) => "synthesis",
            PipelineError::Transcription(_) => "transcription",
            PipelineError::Composition(_) => "composition",
            PipelineError::Storage(_) => "storage",
            PipelineError::Cancelled => "cancelled",
        }
    }
}

impl From<CapabilityError> for PipelineError {
    fn from(err: CapabilityError) -> Self {
        match err {
            CapabilityError::Configuration(msg) => PipelineError::Configuration(msg),
            CapabilityError::Synthesis(msg) => PipelineError::Synthesis(msg),
            CapabilityError::SourceFetch(msg) => PipelineError::SourceFetch(msg),
            CapabilityError::Transcription(msg) => PipelineError::Transcription(msg),
            CapabilityError::Composition(msg) => PipelineError::Composition(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_errors_map_to_pipeline_errors() {
        let err: PipelineError = CapabilityError::SourceFetch("timeout".to_string()).into();
        assert!(matches!(err, PipelineError::SourceFetch(ref m) if m == "timeout"));

        let err: PipelineError = CapabilityError::Configuration("no key".to_string()).into();
        assert_eq!(err.kind(), "configuration");
    }

    #[test]
    fn test_no_content_message() {
        assert_eq!(
            PipelineError::NoContentFound.to_string(),
            "No videos found for that query."
        );
    }

    #[test]
    fn test_validation_message_is_transparent() {
        let err = PipelineError::from(ValidationError::MissingSource);
        assert_eq!(
            err.to_string(),
            "Either a video query or a video file must be provided."
        );
    }
}
