//! Local filesystem storage for uploaded files
//!
//! Every file lives directly inside one flat upload directory under its
//! original filename. Callers are expected to have validated the name with
//! [`crate::shared::validation::is_safe_filename`] first.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::core::error::Result;

pub struct LocalStorage {
    upload_dir: PathBuf,
}

impl LocalStorage {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    /// Create the upload directory if it does not exist yet
    pub async fn ensure_dir_exists(&self) -> Result<()> {
        fs::create_dir_all(&self.upload_dir).await?;
        info!("Upload directory ready: {}", self.upload_dir.display());
        Ok(())
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Absolute location of `name` inside the upload directory
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.upload_dir.join(name)
    }

    pub async fn exists(&self, name: &str) -> Result<bool> {
        Ok(fs::try_exists(self.path_for(name)).await?)
    }

    /// Open a brand-new file for writing
    ///
    /// Fails with [`ErrorKind::AlreadyExists`] instead of truncating an
    /// existing upload.
    pub async fn create_new(&self, name: &str) -> std::io::Result<fs::File> {
        let path = self.path_for(name);
        debug!(path = %path.display(), "storage: create");
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
    }

    /// Track a file that is removed again unless [`PendingFile::commit`] is called
    pub fn pending(&self, name: &str) -> PendingFile {
        PendingFile {
            path: self.path_for(name),
            committed: false,
        }
    }

    /// Remove `name` if present; returns whether a file was deleted
    pub async fn delete_if_exists(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name);
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "storage: deleted");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// A file being written whose upload has not finished yet
///
/// Dropping it uncommitted deletes the file. This covers error returns as well
/// as a request future dropped mid-upload when the client disconnects.
#[must_use]
pub struct PendingFile {
    path: PathBuf,
    committed: bool,
}

impl PendingFile {
    /// Keep the file
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for PendingFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        // Drop cannot await
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "storage: removed unfinished upload"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove unfinished upload {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
