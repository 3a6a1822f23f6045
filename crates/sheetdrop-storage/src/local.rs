use crate::naming::{is_single_component, staging_name, suffixed_name};
use crate::traits::{StagedFile, Storage, StorageError, StorageResult};
use async_trait::async_trait;
use sheetdrop_core::{CollisionPolicy, StoredFile};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

const CHUNK_SIZE: usize = 64 * 1024;
const MAX_SUFFIX_ATTEMPTS: u32 = 10_000;

/// Local filesystem storage implementation
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
    collision_policy: CollisionPolicy,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// The directory is not touched here; it is created by `ensure_ready`.
    pub fn new(base_path: impl Into<PathBuf>, collision_policy: CollisionPolicy) -> Self {
        LocalStorage {
            base_path: base_path.into(),
            collision_policy,
        }
    }

    pub fn collision_policy(&self) -> CollisionPolicy {
        self.collision_policy
    }

    /// Reserve a final path that does not exist yet.
    ///
    /// The reservation is an empty file created with `create_new`, so two
    /// concurrent commits of the same name end up with different paths.
    async fn reserve_unique(&self, file_name: &str) -> StorageResult<PathBuf> {
        for n in 0..MAX_SUFFIX_ATTEMPTS {
            let candidate = if n == 0 {
                file_name.to_string()
            } else {
                suffixed_name(file_name, n)
            };
            let path = self.base_path.join(&candidate);

            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(_) => return Ok(path),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(StorageError::UploadFailed(format!(
                        "Failed to reserve {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }

        Err(StorageError::UploadFailed(format!(
            "No free name for {} after {} attempts",
            file_name, MAX_SUFFIX_ATTEMPTS
        )))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn ensure_ready(&self) -> StorageResult<PathBuf> {
        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create upload directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;
        Ok(self.base_path.clone())
    }

    async fn stage(
        &self,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        max_bytes: u64,
    ) -> StorageResult<StagedFile> {
        let path = self.base_path.join(staging_name(Uuid::new_v4()));
        let start = std::time::Instant::now();

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to create temp file {}: {}",
                    path.display(),
                    e
                ))
            })?;
        let mut staged = StagedFile::new(path);

        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let n = reader
                .read(&mut buf)
                .await
                .map_err(StorageError::SourceFailed)?;
            if n == 0 {
                break;
            }
            if staged.size() + n as u64 > max_bytes {
                return Err(StorageError::TooLarge { limit: max_bytes });
            }
            file.write_all(&buf[..n]).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to write temp file {}: {}",
                    staged.path().display(),
                    e
                ))
            })?;
            staged.add_bytes(n as u64);
        }

        file.flush().await?;
        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to sync temp file {}: {}",
                staged.path().display(),
                e
            ))
        })?;

        tracing::debug!(
            path = %staged.path().display(),
            size_bytes = staged.size(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload staged"
        );

        Ok(staged)
    }

    async fn read_head(&self, staged: &StagedFile, len: usize) -> StorageResult<Vec<u8>> {
        let file = fs::File::open(staged.path()).await?;
        let mut head = Vec::with_capacity(len.min(staged.size() as usize));
        file.take(len as u64).read_to_end(&mut head).await?;
        Ok(head)
    }

    async fn commit(
        &self,
        mut staged: StagedFile,
        original_name: &str,
        file_name: &str,
    ) -> StorageResult<StoredFile> {
        if !is_single_component(file_name) {
            return Err(StorageError::InvalidName(file_name.to_string()));
        }

        let target = match self.collision_policy {
            CollisionPolicy::Suffix => self.reserve_unique(file_name).await?,
            CollisionPolicy::Overwrite => self.base_path.join(file_name),
        };

        if let Err(e) = fs::rename(staged.path(), &target).await {
            if self.collision_policy == CollisionPolicy::Suffix {
                let _ = fs::remove_file(&target).await;
            }
            return Err(StorageError::UploadFailed(format!(
                "Failed to commit {} to {}: {}",
                staged.path().display(),
                target.display(),
                e
            )));
        }
        staged.mark_committed();

        let actual = verify_committed(&target, staged.size()).await?;

        tracing::info!(
            path = %target.display(),
            original_name = %original_name,
            size_bytes = actual,
            "Local storage commit successful"
        );

        Ok(StoredFile {
            original_name: original_name.to_string(),
            stored_path: target,
            size: actual,
        })
    }

    fn root(&self) -> &Path {
        &self.base_path
    }
}

/// Check the committed file's size; on any failure the file is removed so a
/// failed request never leaves a file under its final name.
async fn verify_committed(target: &Path, expected: u64) -> StorageResult<u64> {
    let err = match fs::metadata(target).await {
        Ok(meta) if meta.len() == expected => return Ok(expected),
        Ok(meta) => StorageError::SizeMismatch {
            expected,
            actual: meta.len(),
        },
        Err(e) => StorageError::IoError(e),
    };

    if let Err(e) = fs::remove_file(target).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(
                path = %target.display(),
                error = %e,
                "Failed to remove unverified committed file"
            );
        }
    }
    Err(err)
}
