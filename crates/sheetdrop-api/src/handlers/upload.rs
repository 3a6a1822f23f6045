use crate::error::{size_limit_message, HttpAppError};
use crate::services::{IncomingFile, IngestService};
use crate::state::AppState;
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{header, Method, StatusCode},
    response::IntoResponse,
    Json,
};
use futures::TryStreamExt;
use sheetdrop_core::constants::FILE_FIELD_NAME;
use sheetdrop_core::{AppError, StoredFile, UploadResponse};
use std::io;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::io::StreamReader;

/// Accept a multipart upload and store its `file` part.
///
/// Only the first `file` part is stored; later ones are logged and skipped.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let start = Instant::now();

    let upload_dir = state.storage.ensure_ready().await?;

    let mut multipart =
        multipart.map_err(|e| HttpAppError(AppError::MalformedUpload(e.body_text())))?;

    let limit = state.config.max_upload_size_bytes;
    let service = IngestService::new(&state);
    let mut stored: Option<StoredFile> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) if stored.is_some() => {
                // the file is already committed; a broken trailer does not undo it
                tracing::warn!(error = %e, "Ignoring multipart error after the file part");
                break;
            }
            Err(e) => return Err(multipart_error(e, limit)),
        };

        if field.name() != Some(FILE_FIELD_NAME) {
            continue;
        }

        if stored.is_some() {
            tracing::info!(
                file_name = ?field.file_name(),
                "Ignoring additional file part"
            );
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        let reader = StreamReader::new(field.map_err(io::Error::other));
        tokio::pin!(reader);

        stored = Some(
            service
                .ingest(IncomingFile {
                    file_name,
                    content_type,
                    reader: &mut reader,
                })
                .await?,
        );
    }

    let stored = stored.ok_or(HttpAppError(AppError::NoFilePart))?;

    tracing::info!(
        file_name = %stored.original_name,
        stored_path = %stored.stored_path.display(),
        upload_dir = %upload_dir.display(),
        size_bytes = stored.size,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "File uploaded"
    );

    Ok(Json(UploadResponse::from(stored)))
}

/// Any non-POST method on the upload route.
pub async fn method_not_allowed(method: Method) -> impl IntoResponse {
    (
        [(header::ALLOW, "POST")],
        HttpAppError(AppError::MethodNotAllowed(method.to_string())),
    )
}

fn multipart_error(err: MultipartError, limit: u64) -> HttpAppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        HttpAppError(AppError::PayloadTooLarge(size_limit_message(limit)))
    } else {
        HttpAppError(AppError::MalformedUpload(err.body_text()))
    }
}
