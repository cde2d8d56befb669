//! Per-run working directories and the durable artifact store.
//!
//! - [`workspace`]: scoped temporary directories owned by a single run
//! - [`artifacts`]: published videos keyed by [`rf_protocol::ArtifactId`]

pub mod artifacts;
pub mod error;
pub mod workspace;

pub use artifacts::ArtifactStore;
pub use error::{StorageError, StorageResult};
pub use workspace::{StorageArea, WorkingState};
