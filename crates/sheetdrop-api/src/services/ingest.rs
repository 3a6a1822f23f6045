//! Ingestion of a single uploaded file: stage, verify, name, commit.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use chrono::Utc;
use sheetdrop_core::constants::extension_for_content_type;
use sheetdrop_core::{AppError, StoredFile};
use sheetdrop_processing::{
    sanitize_original_name, sniff, synthesize_name, SpreadsheetFormat, ValidationError, SNIFF_LEN,
};
use sheetdrop_storage::{StagedFile, StorageError};
use tokio::io::AsyncRead;

use crate::error::{size_limit_message, HttpAppError};
use crate::state::AppState;

/// The `file` part of a multipart request, not yet read.
pub struct IncomingFile<'a> {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub reader: &'a mut (dyn AsyncRead + Send + Unpin),
}

pub struct IngestService<'a> {
    state: &'a AppState,
}

impl<'a> IngestService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    pub async fn ingest(&self, file: IncomingFile<'_>) -> Result<StoredFile, HttpAppError> {
        let limit = self.state.config.max_upload_size_bytes;
        let storage = &self.state.storage;

        let staged = storage
            .stage(file.reader, limit)
            .await
            .map_err(|e| stage_error(e, limit))?;

        let content_type = file.content_type.unwrap_or_default();
        let sanitized = file.file_name.as_deref().and_then(sanitize_original_name);

        let format = if self.state.config.verify_file_signature {
            Some(
                self.verify_signature(&staged, sanitized.as_deref(), &content_type)
                    .await?,
            )
        } else {
            None
        };

        let stored_name = match sanitized {
            Some(name) => name,
            None => {
                let extension = extension_for_content_type(&content_type)
                    .or_else(|| format.map(|f| f.extension()));
                synthesize_name(Utc::now(), extension)
            }
        };

        let original_name = file
            .file_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| stored_name.clone());

        let stored = storage.commit(staged, &original_name, &stored_name).await?;
        Ok(stored)
    }

    async fn verify_signature(
        &self,
        staged: &StagedFile,
        file_name: Option<&str>,
        content_type: &str,
    ) -> Result<SpreadsheetFormat, HttpAppError> {
        let head = self.state.storage.read_head(staged, SNIFF_LEN).await?;
        let extension = file_name.and_then(|n| n.rsplit_once('.')).map(|(_, ext)| ext);

        match sniff(&head) {
            Some(format) if extension.map_or(true, |e| format.is_compatible_with_extension(e)) => {
                tracing::debug!(format = ?format, "File signature verified");
                Ok(format)
            }
            sniffed => {
                tracing::debug!(
                    sniffed = ?sniffed,
                    extension = ?extension,
                    "File signature does not match a spreadsheet"
                );
                Err(ValidationError::InvalidType {
                    filename: file_name.unwrap_or("unnamed").to_string(),
                    content_type: if content_type.is_empty() {
                        "unknown type".to_string()
                    } else {
                        content_type.to_string()
                    },
                }
                .into())
            }
        }
    }
}

/// A read error from the request body is an oversized body when the
/// multipart layer says so; anything else is a malformed upload.
fn stage_error(err: StorageError, limit: u64) -> HttpAppError {
    match err {
        StorageError::SourceFailed(io_err) => {
            let status = io_err
                .get_ref()
                .and_then(|inner| inner.downcast_ref::<MultipartError>())
                .map(|e| e.status());
            if status == Some(StatusCode::PAYLOAD_TOO_LARGE) {
                HttpAppError(AppError::PayloadTooLarge(size_limit_message(limit)))
            } else {
                HttpAppError(AppError::MalformedUpload(io_err.to_string()))
            }
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetdrop_core::{Config, ErrorMetadata};
    use sheetdrop_storage::{LocalStorage, Storage};
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn state_for(dir: &Path, vars: &[(&str, &str)]) -> AppState {
        let mut map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        map.insert("UPLOAD_DIR".to_string(), dir.display().to_string());
        let config = Config::from_lookup(|k| map.get(k).cloned(), dir).unwrap();
        let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new(
            config.upload_dir.clone(),
            config.collision_policy,
        ));
        AppState::new(config, storage)
    }

    async fn ingest(
        state: &AppState,
        file_name: Option<&str>,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<StoredFile, HttpAppError> {
        state.storage.ensure_ready().await.unwrap();
        let mut reader = Cursor::new(body.to_vec());
        IngestService::new(state)
            .ingest(IncomingFile {
                file_name: file_name.map(String::from),
                content_type: content_type.map(String::from),
                reader: &mut reader,
            })
            .await
    }

    #[tokio::test]
    async fn test_ingest_keeps_original_name() {
        let dir = tempdir().unwrap();
        let state = state_for(dir.path(), &[]);

        let stored = ingest(&state, Some("data.csv"), Some("text/csv"), b"a,b\n1,2\n")
            .await
            .unwrap();

        assert_eq!(stored.original_name, "data.csv");
        assert_eq!(stored.stored_path, dir.path().join("data.csv"));
        assert_eq!(stored.size, 8);
    }

    #[tokio::test]
    async fn test_ingest_strips_directories_from_name() {
        let dir = tempdir().unwrap();
        let state = state_for(dir.path(), &[]);

        let stored = ingest(&state, Some("../../escape.csv"), None, b"x,y\n")
            .await
            .unwrap();

        assert_eq!(stored.original_name, "../../escape.csv");
        assert_eq!(stored.stored_path, dir.path().join("escape.csv"));
    }

    #[tokio::test]
    async fn test_ingest_synthesizes_missing_name() {
        let dir = tempdir().unwrap();
        let state = state_for(dir.path(), &[]);

        let xlsx = sheetdrop_core::constants::MIME_XLSX;
        let stored = ingest(&state, None, Some(xlsx), b"PK\x03\x04zip").await.unwrap();

        let name = stored.stored_path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("file_"));
        assert!(name.ends_with(".xlsx"));
        assert_eq!(stored.original_name, name);
    }

    #[tokio::test]
    async fn test_ingest_uses_sniffed_extension_without_content_type() {
        let dir = tempdir().unwrap();
        let state = state_for(dir.path(), &[]);

        let stored = ingest(&state, Some(""), None, b"a,b\n").await.unwrap();
        assert!(stored.stored_path.to_string_lossy().ends_with(".csv"));
    }

    #[tokio::test]
    async fn test_signature_mismatch_is_rejected_and_cleaned_up() {
        let dir = tempdir().unwrap();
        let state = state_for(dir.path(), &[]);

        let err = ingest(&state, Some("report.xlsx"), None, b"just,text\n")
            .await
            .unwrap_err();

        assert_eq!(err.0.error_code(), "INVALID_TYPE");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_signature_check_can_be_disabled() {
        let dir = tempdir().unwrap();
        let state = state_for(dir.path(), &[("VERIFY_FILE_SIGNATURE", "false")]);

        let stored = ingest(&state, Some("data.csv"), None, &[0x00, 0x01, 0x02])
            .await
            .unwrap();
        assert_eq!(stored.size, 3);
    }

    #[tokio::test]
    async fn test_oversized_part_is_rejected() {
        let dir = tempdir().unwrap();
        let state = state_for(dir.path(), &[("MAX_UPLOAD_SIZE_MB", "1")]);

        let body = vec![b'a'; 1024 * 1024 + 1];
        let err = ingest(&state, Some("big.csv"), None, &body).await.unwrap_err();

        assert_eq!(err.0.http_status_code(), 413);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_plain_read_error_is_malformed() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = stage_error(StorageError::SourceFailed(io_err), 1024);
        assert_eq!(err.0.error_code(), "MALFORMED_UPLOAD");
    }

    #[test]
    fn test_other_stage_errors_pass_through() {
        let err = stage_error(StorageError::TooLarge { limit: 1024 * 1024 }, 1024 * 1024);
        assert_eq!(err.0.error_code(), "FILE_TOO_LARGE");
    }
}
