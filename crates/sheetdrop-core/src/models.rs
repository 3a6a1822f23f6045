//! Domain models exchanged between the widget, the transport, and the server.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raised when a descriptor would not describe its own content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Descriptor size mismatch: reported {reported} bytes, read {actual} bytes")]
pub struct DescriptorError {
    pub reported: u64,
    pub actual: u64,
}

/// A validated, fully read file selection.
///
/// Immutable once built: `size` always equals the length of `content`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    name: String,
    size: u64,
    mime_type: String,
    last_modified: DateTime<Utc>,
    content: Bytes,
}

impl FileDescriptor {
    /// Build a descriptor, rejecting content whose length disagrees with `size`.
    pub fn new(
        name: impl Into<String>,
        size: u64,
        mime_type: impl Into<String>,
        last_modified: DateTime<Utc>,
        content: Bytes,
    ) -> Result<Self, DescriptorError> {
        let actual = content.len() as u64;
        if actual != size {
            return Err(DescriptorError {
                reported: size,
                actual,
            });
        }

        Ok(Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
            last_modified,
            content,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn into_content(self) -> Bytes {
        self.content
    }
}

/// A file persisted by the ingestion endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub original_name: String,
    pub stored_path: PathBuf,
    pub size: u64,
}

/// Body of a successful ingestion response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub file_name: String,
    pub file_path: String,
    pub size: u64,
}

impl From<StoredFile> for UploadResponse {
    fn from(file: StoredFile) -> Self {
        Self {
            success: true,
            file_name: file.original_name,
            file_path: file.stored_path.to_string_lossy().into_owned(),
            size: file.size,
        }
    }
}
