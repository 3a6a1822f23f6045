//! Upload session state machine.
//!
//! ```text
//! Idle ──drag enter──▶ Dragging ──drag leave──▶ Idle
//! Idle/Dragging/Success/Error ──file chosen──▶ Processing
//! Processing ──intake ok──▶ Success
//! Processing ──intake failed──▶ Error
//! Success/Error ──remove──▶ Idle
//! ```

use chrono::{DateTime, Utc};
use sheetdrop_core::FileDescriptor;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::intake::IntakeError;
use crate::source::FileSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadStatus {
    #[default]
    Idle,
    Dragging,
    Processing,
    Success,
    Error,
}

impl Display for UploadStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadStatus::Idle => write!(f, "idle"),
            UploadStatus::Dragging => write!(f, "dragging"),
            UploadStatus::Processing => write!(f, "processing"),
            UploadStatus::Success => write!(f, "success"),
            UploadStatus::Error => write!(f, "error"),
        }
    }
}

/// Identity of the raw file the user picked, as reported before reading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub last_modified: DateTime<Utc>,
}

impl SelectedFile {
    pub fn from_source(source: &dyn FileSource) -> Self {
        Self {
            name: source.name().to_string(),
            size: source.size(),
            mime_type: source.mime_type().to_string(),
            last_modified: source.last_modified(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    DragEnter,
    DragLeave,
    FileChosen(SelectedFile),
    IntakeSucceeded(FileDescriptor),
    IntakeFailed(IntakeError),
    Remove,
}

impl UploadEvent {
    fn name(&self) -> &'static str {
        match self {
            UploadEvent::DragEnter => "drag_enter",
            UploadEvent::DragLeave => "drag_leave",
            UploadEvent::FileChosen(_) => "file_chosen",
            UploadEvent::IntakeSucceeded(_) => "intake_succeeded",
            UploadEvent::IntakeFailed(_) => "intake_failed",
            UploadEvent::Remove => "remove",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("A file is already being processed")]
    Busy,

    #[error("Event '{event}' is not valid while {status}")]
    Invalid {
        status: UploadStatus,
        event: &'static str,
    },
}

/// Interaction state of one widget instance.
///
/// `selected_file` is present iff the status is Processing, Success or Error;
/// `error` iff Error; `descriptor` iff Success. Only [`transition`] builds
/// non-idle sessions, so these hold by construction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UploadSession {
    status: UploadStatus,
    selected_file: Option<SelectedFile>,
    error: Option<IntakeError>,
    descriptor: Option<FileDescriptor>,
}

impl UploadSession {
    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_ref()
    }

    pub fn error(&self) -> Option<&IntakeError> {
        self.error.as_ref()
    }

    pub fn descriptor(&self) -> Option<&FileDescriptor> {
        self.descriptor.as_ref()
    }

    fn with_status(status: UploadStatus) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }
}

/// Compute the session that follows `session` after `event`.
pub fn transition(
    session: &UploadSession,
    event: UploadEvent,
) -> Result<UploadSession, TransitionError> {
    use UploadStatus::*;

    let invalid = |event: &UploadEvent| TransitionError::Invalid {
        status: session.status,
        event: event.name(),
    };

    match (session.status, event) {
        (Idle, UploadEvent::DragEnter) => Ok(UploadSession::with_status(Dragging)),
        (Dragging, UploadEvent::DragLeave) => Ok(UploadSession::with_status(Idle)),
        // drag feedback only applies while nothing is selected
        (_, UploadEvent::DragEnter) | (_, UploadEvent::DragLeave) => Ok(session.clone()),

        (Processing, UploadEvent::FileChosen(_)) => Err(TransitionError::Busy),
        (_, UploadEvent::FileChosen(file)) => Ok(UploadSession {
            status: Processing,
            selected_file: Some(file),
            error: None,
            descriptor: None,
        }),

        (Processing, UploadEvent::IntakeSucceeded(descriptor)) => Ok(UploadSession {
            status: Success,
            selected_file: session.selected_file.clone(),
            error: None,
            descriptor: Some(descriptor),
        }),
        (Processing, UploadEvent::IntakeFailed(error)) => Ok(UploadSession {
            status: Error,
            selected_file: session.selected_file.clone(),
            error: Some(error),
            descriptor: None,
        }),

        (Success, UploadEvent::Remove) | (Error, UploadEvent::Remove) => {
            Ok(UploadSession::with_status(Idle))
        }

        (_, event) => Err(invalid(&event)),
    }
}
