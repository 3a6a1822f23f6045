use sheetdrop_core::constants::PICKER_ACCEPT;

use crate::state::{UploadSession, UploadStatus};

pub const PROMPT_TITLE: &str = "Upload a data file";
pub const PROMPT_HINT: &str = "Drag a file here or click to choose one";
pub const PROMPT_FORMATS: &str = "CSV, Excel (.xlsx/.xls), up to 100MB";
pub const DROP_OVERLAY_TEXT: &str = "Release to start the upload";
pub const SUCCESS_MESSAGE: &str = "File uploaded successfully, ready for analysis";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIndicator {
    Upload,
    Spinner,
    Check,
    Cross,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderTone {
    Neutral,
    Active,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineMessage {
    Success(String),
    Error(String),
}

/// Text shown in the drop zone while no file is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prompt {
    pub title: &'static str,
    pub hint: &'static str,
    pub formats: &'static str,
}

impl Default for Prompt {
    fn default() -> Self {
        Self {
            title: PROMPT_TITLE,
            hint: PROMPT_HINT,
            formats: PROMPT_FORMATS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub name: String,
    /// e.g. "1.50 MB"
    pub size_label: String,
}

/// Everything a renderer needs to draw the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetView {
    pub indicator: StatusIndicator,
    pub border: BorderTone,
    /// Selected file; `None` shows the prompt instead.
    pub file: Option<FileSummary>,
    pub prompt: Option<Prompt>,
    pub can_remove: bool,
    pub picker_disabled: bool,
    pub show_drop_overlay: bool,
    pub overlay_text: Option<&'static str>,
    pub message: Option<InlineMessage>,
    pub accept: &'static str,
}

impl WidgetView {
    pub fn from_session(session: &UploadSession) -> Self {
        let status = session.status();

        let indicator = match status {
            UploadStatus::Idle | UploadStatus::Dragging => StatusIndicator::Upload,
            UploadStatus::Processing => StatusIndicator::Spinner,
            UploadStatus::Success => StatusIndicator::Check,
            UploadStatus::Error => StatusIndicator::Cross,
        };

        let border = match status {
            UploadStatus::Dragging => BorderTone::Active,
            UploadStatus::Success => BorderTone::Success,
            UploadStatus::Error => BorderTone::Error,
            UploadStatus::Idle | UploadStatus::Processing => BorderTone::Neutral,
        };

        let file = session.selected_file().map(|f| FileSummary {
            name: f.name.clone(),
            size_label: format_size_mb(f.size),
        });

        let message = match status {
            UploadStatus::Success => Some(InlineMessage::Success(SUCCESS_MESSAGE.to_string())),
            UploadStatus::Error => session
                .error()
                .map(|e| InlineMessage::Error(e.message.clone())),
            _ => None,
        };

        let dragging = status == UploadStatus::Dragging;

        Self {
            indicator,
            border,
            can_remove: file.is_some() && status != UploadStatus::Processing,
            prompt: file.is_none().then(Prompt::default),
            file,
            picker_disabled: status == UploadStatus::Processing,
            show_drop_overlay: dragging,
            overlay_text: dragging.then_some(DROP_OVERLAY_TEXT),
            message,
            accept: PICKER_ACCEPT,
        }
    }
}

/// Size in MiB with two decimals.
pub fn format_size_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}
