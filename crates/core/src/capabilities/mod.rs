//! External capabilities the pipeline is built from.
//!
//! - [`base`]: capability traits and shared types
//! - [`adapters`]: real (edge-tts, Pexels, whisper, ffmpeg) and mock adapters
//! - [`manager`]: the bundle of adapters handed to the engine
//! - [`runner`]: subprocess execution shared by the tool adapters

pub mod adapters;
pub mod base;
pub mod manager;
pub mod runner;

pub use base::{
    clip_count, CapabilityError, ClipLink, Compositor, SynthesizedAudio, Transcriber,
    TranscriptSegment, VideoSource, Voiceover, TARGET_HEIGHT, TARGET_WIDTH,
};
pub use manager::CapabilitySet;
