//! Storage abstraction trait
//!
//! This module defines the Storage trait that the ingestion endpoint writes through.

use async_trait::async_trait;
use sheetdrop_core::StoredFile;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// The byte source (request body, local file) failed mid-read.
    #[error("Failed to read upload source: {0}")]
    SourceFailed(#[source] std::io::Error),

    #[error("Upload exceeds the limit of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("Size mismatch after commit: expected {expected} bytes, found {actual} bytes")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A fully written upload that has not been committed under its final name yet.
///
/// Dropping an uncommitted `StagedFile` removes the temp file.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    size: u64,
    committed: bool,
}

impl StagedFile {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self {
            path,
            size: 0,
            committed: false,
        }
    }

    pub(crate) fn add_bytes(&mut self, n: u64) {
        self.size += n;
    }

    pub(crate) fn mark_committed(&mut self) {
        self.committed = true;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of bytes written to the temp file.
    pub fn size(&self) -> u64 {
        self.size
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Removed uncommitted staged file");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove uncommitted staged file"
                );
            }
        }
    }
}

/// Storage abstraction trait
///
/// Writes go through `stage` then `commit`; nothing is ever written directly
/// under a final name.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Create the storage root if it is missing and return its path.
    ///
    /// Called on every request, so a directory removed at runtime is recreated.
    async fn ensure_ready(&self) -> StorageResult<PathBuf>;

    /// Stream `reader` to a new temp file, failing with `TooLarge` once more
    /// than `max_bytes` have been read.
    async fn stage(
        &self,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        max_bytes: u64,
    ) -> StorageResult<StagedFile>;

    /// Read up to `len` leading bytes of a staged file.
    async fn read_head(&self, staged: &StagedFile, len: usize) -> StorageResult<Vec<u8>>;

    /// Move a staged file to its final name, applying the collision policy.
    ///
    /// `original_name` is what the client submitted; `file_name` is the
    /// sanitized name to store under.
    async fn commit(
        &self,
        staged: StagedFile,
        original_name: &str,
        file_name: &str,
    ) -> StorageResult<StoredFile>;

    /// Storage root directory.
    fn root(&self) -> &Path;
}
