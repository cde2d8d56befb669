//! The fixed stage schedule of a pipeline run.
//!
//! Every stage announces itself with one event carrying a fixed status text
//! and progress checkpoint before its work begins. The checkpoints are
//! strictly increasing in schedule order.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One discrete unit of pipeline work, in execution order.
///
/// `SourceDownload` and `SourceConcatenate` only occur in query mode, and
/// `SourceConcatenate` only when more than one clip was found.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TS)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Voiceover,
    SourceSearch,
    SourceDownload,
    SourceConcatenate,
    SubtitleGeneration,
    Composition,
    SubtitleBurn,
    Complete,
}

impl Stage {
    /// All stages in schedule order.
    pub const ALL: [Stage; 8] = [
        Stage::Voiceover,
        Stage::SourceSearch,
        Stage::SourceDownload,
        Stage::SourceConcatenate,
        Stage::SubtitleGeneration,
        Stage::Composition,
        Stage::SubtitleBurn,
        Stage::Complete,
    ];

    /// Progress reported when the stage starts.
    pub fn checkpoint(self) -> u8 {
        match self {
            Stage::Voiceover => 10,
            Stage::SourceSearch => 30,
            Stage::SourceDownload => 40,
            Stage::SourceConcatenate => 50,
            Stage::SubtitleGeneration => 60,
            Stage::Composition => 80,
            Stage::SubtitleBurn => 90,
            Stage::Complete => 100,
        }
    }

    /// Human-readable status shown to the client.
    pub fn status_text(self) -> &'static str {
        match self {
            Stage::Voiceover => "Generating voiceover...",
            Stage::SourceSearch => "Finding background video...",
            Stage::SourceDownload => "Downloading background videos...",
            Stage::SourceConcatenate => "Combining background videos...",
            Stage::SubtitleGeneration => "Generating subtitles...",
            Stage::Composition => "Composing video... this may take a moment.",
            Stage::SubtitleBurn => "Adding subtitles to video...",
            Stage::Complete => "Done",
        }
    }

    /// Short machine name, used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Stage::Voiceover => "voiceover",
            Stage::SourceSearch => "source_search",
            Stage::SourceDownload => "source_download",
            Stage::SourceConcatenate => "source_concatenate",
            Stage::SubtitleGeneration => "subtitle_generation",
            Stage::Composition => "composition",
            Stage::SubtitleBurn => "subtitle_burn",
            Stage::Complete => "complete",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoints_strictly_increase() {
        let checkpoints: Vec<u8> = Stage::ALL.iter().map(|s| s.checkpoint()).collect();
        assert!(checkpoints.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(checkpoints.last(), Some(&100));
    }

    #[test]
    fn test_schedule_values() {
        assert_eq!(Stage::Voiceover.checkpoint(), 10);
        assert_eq!(Stage::SourceSearch.checkpoint(), 30);
        assert_eq!(Stage::SourceDownload.checkpoint(), 40);
        assert_eq!(Stage::SourceConcatenate.checkpoint(), 50);
        assert_eq!(Stage::SubtitleGeneration.checkpoint(), 60);
        assert_eq!(Stage::Composition.checkpoint(), 80);
        assert_eq!(Stage::SubtitleBurn.checkpoint(), 90);
        assert_eq!(Stage::Complete.status_text(), "Done");
    }
}
