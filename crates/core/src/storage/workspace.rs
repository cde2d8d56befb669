//! Scoped per-run working directories.
//!
//! A [`WorkingState`] owns one freshly allocated temporary directory. It is
//! handed to exactly one run and released either through
//! [`WorkingState::dispose`] or, if the run is dropped mid-flight, by the
//! underlying [`tempfile::TempDir`] guard.

use crate::storage::artifacts::ArtifactStore;
use crate::storage::error::{StorageError, StorageResult};
use rf_protocol::ArtifactId;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

const WORKSPACE_PREFIX: &str = "reelforge-";

/// Allocates working directories and publishes finished videos.
#[derive(Debug, Clone)]
pub struct StorageArea {
    work_root: Option<PathBuf>,
    artifacts: ArtifactStore,
}

impl StorageArea {
    /// Create a storage area.
    ///
    /// # Arguments
    ///
    /// * `work_root` - Parent directory for working directories, or `None`
    ///   for the system temporary directory
    /// * `artifacts` - Durable store receiving published videos
    pub fn new(work_root: Option<PathBuf>, artifacts: ArtifactStore) -> Self {
        Self {
            work_root,
            artifacts,
        }
    }

    /// Allocate a fresh, uniquely named working directory.
    ///
    /// The filesystem work runs on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::CreateWorkspace` if the filesystem refuses.
    pub async fn create(&self) -> StorageResult<WorkingState> {
        let work_root = self.work_root.clone();
        let fallback = work_root.clone().unwrap_or_else(std::env::temp_dir);

        let dir = tokio::task::spawn_blocking(move || allocate(work_root.as_deref()))
            .await
            .map_err(|e| StorageError::CreateWorkspace {
                path: fallback,
                source: std::io::Error::other(e.to_string()),
            })??;

        debug!(path = %dir.path().display(), "Allocated working directory");
        Ok(WorkingState { dir })
    }

    /// Move a finished file into the durable output area.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Publish` if the file cannot be moved or copied.
    pub async fn publish(&self, local: &Path) -> StorageResult<ArtifactId> {
        self.artifacts.publish(local).await
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }
}

fn allocate(work_root: Option<&Path>) -> StorageResult<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(WORKSPACE_PREFIX);

    let dir = match work_root {
        Some(root) => {
            std::fs::create_dir_all(root).map_err(|source| StorageError::CreateWorkspace {
                path: root.to_path_buf(),
                source,
            })?;
            builder.tempdir_in(root)
        }
        None => builder.tempdir(),
    };

    dir.map_err(|source| StorageError::CreateWorkspace {
        path: work_root
            .map(Path::to_path_buf)
            .unwrap_or_else(std::env::temp_dir),
        source,
    })
}

/// Request-scoped storage holding one run's intermediate files.
///
/// Never shared across runs. Intermediate files live at fixed names inside
/// the directory so each stage knows where the previous one left its output.
#[derive(Debug)]
pub struct WorkingState {
    dir: TempDir,
}

impl WorkingState {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn audio_path(&self) -> PathBuf {
        self.dir.path().join("voice.mp3")
    }

    pub fn background_path(&self) -> PathBuf {
        self.dir.path().join("background.mp4")
    }

    /// Download target for the `index`-th clip, preserving search order.
    pub fn clip_path(&self, index: usize) -> PathBuf {
        self.dir.path().join(format!("clip_{index:02}.mp4"))
    }

    pub fn srt_path(&self) -> PathBuf {
        self.dir.path().join("subtitles.srt")
    }

    pub fn composed_path(&self) -> PathBuf {
        self.dir.path().join("composed.mp4")
    }

    pub fn final_path(&self) -> PathBuf {
        self.dir.path().join("final.mp4")
    }

    /// Write raw bytes to `path` inside the working directory.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Write` on any I/O failure.
    pub async fn write_file(&self, path: &Path, contents: &[u8]) -> StorageResult<()> {
        tokio::fs::write(path, contents)
            .await
            .map_err(|source| StorageError::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Recursively remove the directory and everything in it.
    ///
    /// Consumes the state, so a working directory is disposed at most once.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Dispose` if removal fails.
    pub async fn dispose(self) -> StorageResult<()> {
        let path = self.dir.path().to_path_buf();
        let dir = self.dir;
        tokio::task::spawn_blocking(move || dir.close())
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))
            .and_then(|closed| closed)
            .map_err(|source| StorageError::Dispose {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), "Disposed working directory");
        Ok(())
    }
}
