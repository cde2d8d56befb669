//! # rf-protocol
//!
//! Core protocol definitions and data models for reelforge.
//!
//! This crate defines all shared data structures used for:
//! - Validated pipeline submissions
//! - The fixed stage schedule and its progress checkpoints
//! - Progress events and their JSON wire form
//! - Run snapshots reported by the status endpoint
//! - Service configuration parsed from `reelforge.toml`
//!
//! ## Modules
//!
//! - [`request_models`]: Pipeline submissions and their validation
//! - [`stage_models`]: Stage schedule (status text + progress checkpoint)
//! - [`event_models`]: Stage events and the streamed wire format
//! - [`run_models`]: Runtime run state for status queries
//! - [`config_models`]: Service configuration
//!
//! ## Design Principles
//!
//! - No I/O: every type here is plain data
//! - TypeScript generation: wire types derive `TS` for the web client
//! - Independent compilation: No dependencies on other reelforge crates

pub mod config_models;
pub mod event_models;
pub mod request_models;
pub mod run_models;
pub mod stage_models;

// Re-export all public types for convenience
pub use config_models::*;
pub use event_models::*;
pub use request_models::*;
pub use run_models::*;
pub use stage_models::*;
