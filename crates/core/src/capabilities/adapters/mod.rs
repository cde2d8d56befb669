//! Concrete capability adapters.

pub mod edge_tts;
pub mod ffmpeg;
pub mod mock;
pub mod pexels;
pub mod whisper;

pub use edge_tts::EdgeTtsVoiceover;
pub use ffmpeg::{probe_duration, FfmpegCompositor};
pub use mock::{MockCompositor, MockTranscriber, MockVideoSource, MockVoiceover};
pub use pexels::PexelsVideoSource;
pub use whisper::WhisperTranscriber;
