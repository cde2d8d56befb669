//! Durable store of published videos.
//!
//! Artifacts are plain files named by their [`ArtifactId`] inside a single
//! output directory. Runs never coordinate: each one writes under a freshly
//! generated id.

use crate::storage::error::{StorageError, StorageResult};
use rf_protocol::ArtifactId;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open the store, creating the output directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::OutputDir` if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| StorageError::OutputDir {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Move `local` into the store under a new identifier.
    ///
    /// A rename is attempted first. When source and store sit on different
    /// filesystems the file is copied to a hidden `.<id>.partial` name in the
    /// store and renamed into place, so a reader never sees a partial
    /// artifact. The move runs to completion on the blocking pool even if
    /// the returned future is dropped.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Publish` if the file cannot be moved or copied.
    /// No file is left behind in the store on error.
    pub async fn publish(&self, local: &Path) -> StorageResult<ArtifactId> {
        let id = ArtifactId::generate();
        let dest = self.root.join(id.as_str());
        let partial = self.root.join(partial_name(&id));
        let source = local.to_path_buf();

        tokio::task::spawn_blocking(move || move_into_store(&source, &dest, &partial))
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))
            .and_then(|moved| moved)
            .map_err(|source| StorageError::Publish {
                path: local.to_path_buf(),
                source,
            })?;

        info!(video_id = %id, "Published artifact");
        Ok(id)
    }

    /// Resolve an identifier to its stored file.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for malformed ids, unknown ids, and
    /// files removed out-of-band.
    pub async fn get(&self, id: &str) -> StorageResult<PathBuf> {
        let id = ArtifactId::parse(id).map_err(|_| StorageError::NotFound(id.to_string()))?;
        let path = self.root.join(id.as_str());

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            _ => Err(StorageError::NotFound(id.to_string())),
        }
    }

    /// Remove artifacts whose modification time is at least `ttl` ago.
    ///
    /// Only files named like an artifact are considered. Returns the number
    /// of files removed.
    pub fn sweep_expired(&self, ttl: Duration) -> StorageResult<usize> {
        let now = SystemTime::now();
        let mut removed = 0;

        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|source| StorageError::Scan {
                path: self.root.clone(),
                source,
            })?;

            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if ArtifactId::parse(name).is_err() {
                continue;
            }

            let age = entry
                .metadata()
                .ok()
                .and_then(|meta| meta.modified().ok())
                .and_then(|modified| now.duration_since(modified).ok());

            // Files stamped in the future are kept.
            let Some(age) = age else {
                continue;
            };

            if age >= ttl {
                match std::fs::remove_file(entry.path()) {
                    Ok(()) => {
                        debug!(video_id = name, "Removed expired artifact");
                        removed += 1;
                    }
                    Err(e) => warn!(video_id = name, error = %e, "Failed to remove expired artifact"),
                }
            }
        }

        if removed > 0 {
            info!(removed, "Swept expired artifacts");
        }
        Ok(removed)
    }
}

fn partial_name(id: &ArtifactId) -> String {
    format!(".{id}.partial")
}

fn move_into_store(local: &Path, dest: &Path, partial: &Path) -> std::io::Result<()> {
    match std::fs::rename(local, dest) {
        Ok(()) => return Ok(()),
        Err(e) => debug!(error = %e, "Rename failed, falling back to copy"),
    }

    let committed = std::fs::copy(local, partial).and_then(|_| std::fs::rename(partial, dest));
    if let Err(e) = committed {
        if let Err(cleanup) = std::fs::remove_file(partial) {
            if cleanup.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %partial.display(), error = %cleanup, "Failed to remove partial artifact");
            }
        }
        return Err(e);
    }

    if let Err(e) = std::fs::remove_file(local) {
        warn!(path = %local.display(), error = %e, "Failed to remove published source");
    }
    Ok(())
}
