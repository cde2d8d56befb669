//! # rf-core
//!
//! Core pipeline engine for reelforge.
//!
//! This crate provides:
//! - Configuration loading from `reelforge.toml` and the environment
//! - Per-run working directories and the durable artifact store
//! - Capability traits with real (edge-tts, Pexels, whisper, ffmpeg) and mock adapters
//! - The progress feed and the pipeline execution engine
//! - Run management for concurrent, cancellable runs
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading
//! - [`storage`]: Working directories and published artifacts
//! - [`capabilities`]: Capability traits and adapters
//! - [`subtitles`]: SRT and ASS generation
//! - [`progress`]: Per-run progress feed
//! - [`engine`]: Pipeline execution engine
//! - [`state`]: Run management

pub mod capabilities;
pub mod config;
pub mod engine;
pub mod error;
pub mod progress;
pub mod state;
pub mod storage;
pub mod subtitles;

pub use error::PipelineError;
