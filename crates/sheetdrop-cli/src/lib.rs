//! Composition of the upload widget with an HTTP transport for command-line use.

use anyhow::Context;
use serde::Serialize;
use sheetdrop_api_client::Transport;
use sheetdrop_core::{FileDescriptor, UploadResponse};
use sheetdrop_widget::{
    format_size_mb, FileSource, InlineMessage, LocalFile, SelectionOutcome, UploadWidget,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Open every path as a file source, failing on the first unreadable one.
pub async fn open_sources(paths: &[PathBuf]) -> anyhow::Result<Vec<Arc<dyn FileSource>>> {
    let mut sources: Vec<Arc<dyn FileSource>> = Vec::with_capacity(paths.len());
    for path in paths {
        let file = LocalFile::open(path)
            .await
            .with_context(|| format!("Failed to open file: {}", path.display()))?;
        sources.push(Arc::new(file));
    }
    Ok(sources)
}

#[derive(Debug, Serialize)]
pub struct UploadReport {
    #[serde(flatten)]
    pub response: UploadResponse,
    /// Selected files after the first that were not uploaded.
    pub discarded: usize,
}

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub valid: bool,
    pub file_name: Option<String>,
    pub size: Option<u64>,
    pub size_label: Option<String>,
    pub mime_type: Option<String>,
    pub last_modified: Option<String>,
    pub message: Option<String>,
    pub discarded: usize,
}

/// Widget whose callback forwards each accepted descriptor into a channel.
fn channel_widget() -> (UploadWidget, mpsc::UnboundedReceiver<FileDescriptor>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let widget = UploadWidget::new(move |source, descriptor| {
        if tx.send(descriptor).is_err() {
            tracing::warn!(file_name = %source.name(), "Descriptor receiver dropped");
        }
    });
    (widget, rx)
}

/// Validate and read the first source, then submit it through `transport`.
pub async fn run_upload(
    transport: &dyn Transport,
    sources: Vec<Arc<dyn FileSource>>,
) -> anyhow::Result<UploadReport> {
    let (mut widget, mut rx) = channel_widget();

    match widget.select_files(sources).await {
        SelectionOutcome::Accepted { discarded, .. } => {
            let descriptor = rx
                .try_recv()
                .context("Accepted file was not handed to the callback")?;
            let response = transport
                .submit(&descriptor)
                .await
                .with_context(|| format!("Failed to upload {}", descriptor.name()))?;
            Ok(UploadReport {
                response,
                discarded,
            })
        }
        SelectionOutcome::Failed { error, .. } => Err(anyhow::anyhow!(error.message)),
        SelectionOutcome::Empty => Err(anyhow::anyhow!("No file selected")),
        SelectionOutcome::Busy => Err(anyhow::anyhow!("Another file is being processed")),
    }
}

/// Validate and read the first source without uploading it.
pub async fn run_check(sources: Vec<Arc<dyn FileSource>>) -> CheckReport {
    let (mut widget, mut rx) = channel_widget();
    let outcome = widget.select_files(sources).await;
    let message = widget.view().message.map(|m| match m {
        InlineMessage::Success(text) | InlineMessage::Error(text) => text,
    });

    match (outcome, rx.try_recv().ok()) {
        (SelectionOutcome::Accepted { discarded, .. }, Some(descriptor)) => CheckReport {
            valid: true,
            file_name: Some(descriptor.name().to_string()),
            size: Some(descriptor.size()),
            size_label: Some(format_size_mb(descriptor.size())),
            mime_type: Some(descriptor.mime_type().to_string()),
            last_modified: Some(descriptor.last_modified().to_rfc3339()),
            message,
            discarded,
        },
        (outcome, _) => CheckReport {
            valid: false,
            file_name: None,
            size: None,
            size_label: None,
            mime_type: None,
            last_modified: None,
            message: message.or_else(|| Some("No file selected".to_string())),
            discarded: outcome.discarded(),
        },
    }
}
