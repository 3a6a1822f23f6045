//! Submission of a validated file to the upload endpoint.

use crate::ApiClient;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sheetdrop_core::constants::{content_type_for_file_name, FILE_FIELD_NAME};
use sheetdrop_core::{FileDescriptor, UploadResponse};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Upload rejected with status {status}: {error}")]
    Rejected {
        status: u16,
        code: Option<String>,
        error: String,
        details: Option<String>,
    },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    /// Whether the same submission may succeed if tried again.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Rejected { status, .. } => *status >= 500,
            TransportError::Request(err) => err.is_timeout() || err.is_connect(),
            TransportError::InvalidResponse(_) => false,
        }
    }
}

/// Sends a descriptor's content to the server.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn submit(&self, descriptor: &FileDescriptor) -> Result<UploadResponse, TransportError>;
}

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type for the multipart part. Platforms often report none, so an
/// empty or unparseable type falls back to the one implied by the extension.
fn part_content_type(descriptor: &FileDescriptor) -> &str {
    let reported = descriptor.mime_type().trim();
    if !reported.is_empty() && reported.parse::<mime::Mime>().is_ok() {
        return reported;
    }
    content_type_for_file_name(descriptor.name()).unwrap_or(FALLBACK_CONTENT_TYPE)
}

/// Error body returned by the server on failure.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

#[async_trait]
impl Transport for ApiClient {
    async fn submit(&self, descriptor: &FileDescriptor) -> Result<UploadResponse, TransportError> {
        let part = Part::stream_with_length(descriptor.content().clone(), descriptor.size())
            .file_name(descriptor.name().to_string())
            .mime_str(part_content_type(descriptor))?;
        let form = Form::new().part(FILE_FIELD_NAME, part);

        let url = self.build_url(self.upload_route());
        tracing::debug!(
            url = %url,
            file_name = %descriptor.name(),
            size_bytes = descriptor.size(),
            "Submitting file"
        );

        let response = self.client().post(&url).multipart(form).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let rejected = match serde_json::from_str::<ErrorBody>(&text) {
                Ok(body) => TransportError::Rejected {
                    status: status.as_u16(),
                    code: body.code,
                    error: body.error,
                    details: body.details,
                },
                Err(_) => TransportError::Rejected {
                    status: status.as_u16(),
                    code: None,
                    error: if text.trim().is_empty() {
                        status
                            .canonical_reason()
                            .unwrap_or("Unknown error")
                            .to_string()
                    } else {
                        text
                    },
                    details: None,
                },
            };
            tracing::warn!(status = status.as_u16(), error = %rejected, "Upload rejected");
            return Err(rejected);
        }

        let body: UploadResponse = serde_json::from_str(&text)
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        if !body.success {
            return Err(TransportError::InvalidResponse(
                "Server reported success: false".to_string(),
            ));
        }

        tracing::info!(
            file_name = %body.file_name,
            file_path = %body.file_path,
            size_bytes = body.size,
            "File submitted"
        );
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::Utc;
    use mockito::Matcher;

    fn csv_descriptor() -> FileDescriptor {
        let content = Bytes::from_static(b"name,amount\nalice,10\n");
        FileDescriptor::new("data.csv", content.len() as u64, "text/csv", Utc::now(), content)
            .unwrap()
    }

    #[tokio::test]
    async fn submit_posts_multipart_file_part() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/upload")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data; boundary=".to_string()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="file"; filename="data.csv""#.to_string()),
                Matcher::Regex("alice,10".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"success":true,"fileName":"data.csv","filePath":"/srv/uploads/data.csv","size":21}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(server.url()).unwrap();
        let response = client.submit(&csv_descriptor()).await.unwrap();

        mock.assert_async().await;
        assert!(response.success);
        assert_eq!(response.file_name, "data.csv");
        assert_eq!(response.file_path, "/srv/uploads/data.csv");
        assert_eq!(response.size, 21);
    }

    fn descriptor_with_type(name: &str, mime_type: &str) -> FileDescriptor {
        let content = Bytes::from_static(b"a,b\n");
        FileDescriptor::new(name, content.len() as u64, mime_type, Utc::now(), content).unwrap()
    }

    #[tokio::test]
    async fn submit_without_mime_type_uses_extension() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/upload")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"filename="data.csv""#.to_string()),
                Matcher::Regex("(?i)content-type: text/csv".to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"success":true,"fileName":"data.csv","filePath":"data.csv","size":4}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url()).unwrap();
        let response = client
            .submit(&descriptor_with_type("data.csv", ""))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.size, 4);
    }

    #[tokio::test]
    async fn submit_with_unparseable_mime_type_falls_back() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/upload")
            .match_body(Matcher::Regex(
                "(?i)content-type: application/octet-stream".to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"success":true,"fileName":"export","filePath":"export","size":4}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url()).unwrap();
        client
            .submit(&descriptor_with_type("export", "not a mime"))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn submit_uses_configured_route() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/ingest")
            .with_status(200)
            .with_body(r#"{"success":true,"fileName":"data.csv","filePath":"data.csv","size":21}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url())
            .unwrap()
            .with_upload_route("/ingest")
            .unwrap();
        client.submit(&csv_descriptor()).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejection_carries_server_error_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/upload")
            .with_status(413)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"error":"File size exceeds maximum allowed size of 100 MB","code":"FILE_TOO_LARGE","recoverable":false}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(server.url()).unwrap();
        let err = client.submit(&csv_descriptor()).await.unwrap_err();

        match err {
            TransportError::Rejected {
                status,
                code,
                error,
                details,
            } => {
                assert_eq!(status, 413);
                assert_eq!(code.as_deref(), Some("FILE_TOO_LARGE"));
                assert!(error.contains("100 MB"));
                assert!(details.is_none());
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn plain_text_rejection_is_kept_verbatim() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/upload")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let client = ApiClient::new(server.url()).unwrap();
        let err = client.submit(&csv_descriptor()).await.unwrap_err();

        assert!(err.is_retryable());
        match err {
            TransportError::Rejected { status, error, .. } => {
                assert_eq!(status, 502);
                assert_eq!(error, "bad gateway");
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn malformed_success_body_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/upload")
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let client = ApiClient::new(server.url()).unwrap();
        let err = client.submit(&csv_descriptor()).await.unwrap_err();

        assert!(matches!(err, TransportError::InvalidResponse(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn client_errors_are_not_retryable() {
        let err = TransportError::Rejected {
            status: 415,
            code: Some("INVALID_TYPE".to_string()),
            error: "Invalid file type".to_string(),
            details: None,
        };
        assert!(!err.is_retryable());
    }
}
