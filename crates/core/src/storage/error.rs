//! Error types for working directories and the artifact store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while allocating, cleaning up, or publishing files.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The per-run temporary directory could not be allocated.
    #[error("Failed to create working directory under {path}: {source}")]
    CreateWorkspace {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The per-run temporary directory could not be removed.
    #[error("Failed to remove working directory {path}: {source}")]
    Dispose {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The durable output directory could not be created.
    #[error("Failed to prepare output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A file inside the working directory could not be written.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A finished video could not be moved into the output directory.
    #[error("Failed to publish {path}: {source}")]
    Publish {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The requested artifact does not exist.
    #[error("Video not found: {0}")]
    NotFound(String),

    /// The output directory could not be scanned for expired artifacts.
    #[error("Failed to scan output directory {path}: {source}")]
    Scan {
        path: PathBuf,
        source: walkdir::Error,
    },
}

/// Type alias for Result with StorageError.
pub type StorageResult<T> = Result<T, StorageError>;
