//! Raw file handles the widget can take in.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use std::io;
use std::path::{Path, PathBuf};

/// A user-selected file before it has been read.
///
/// Metadata is what the platform reports and may be unreliable (empty MIME
/// types are common); `read_all` yields the actual bytes.
#[async_trait]
pub trait FileSource: Debug + Send + Sync {
    fn name(&self) -> &str;
    fn size(&self) -> u64;
    fn mime_type(&self) -> &str;
    fn last_modified(&self) -> DateTime<Utc>;

    async fn read_all(&self) -> io::Result<Bytes>;
}

/// A file on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
    size: u64,
    mime_type: String,
    last_modified: DateTime<Utc>,
}

impl LocalFile {
    /// Stat `path` and guess its MIME type from the extension.
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = mime_guess::from_path(&path)
            .first_raw()
            .unwrap_or_default()
            .to_string();
        let last_modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(Self {
            name,
            size: metadata.len(),
            mime_type,
            last_modified,
            path,
        })
    }
}

#[async_trait]
impl FileSource for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    async fn read_all(&self) -> io::Result<Bytes> {
        let data = tokio::fs::read(&self.path).await?;
        Ok(Bytes::from(data))
    }
}

/// An in-memory file, e.g. the payload of a drop event.
#[derive(Debug, Clone)]
pub struct MemoryFile {
    name: String,
    mime_type: String,
    last_modified: DateTime<Utc>,
    content: Bytes,
}

impl MemoryFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, content: Bytes) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            last_modified: Utc::now(),
            content,
        }
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = last_modified;
        self
    }
}

#[async_trait]
impl FileSource for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.content.len() as u64
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    async fn read_all(&self) -> io::Result<Bytes> {
        Ok(self.content.clone())
    }
}
