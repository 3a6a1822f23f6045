use sheetdrop_core::constants::PICKER_ACCEPT;
use sheetdrop_core::FileDescriptor;
use std::sync::Arc;

use crate::intake::{FileIntake, IntakeError};
use crate::source::FileSource;
use crate::state::{transition, SelectedFile, TransitionError, UploadEvent, UploadSession};
use crate::view::WidgetView;

/// Invoked once per successfully validated and read selection.
pub type FileUploadCallback = Box<dyn Fn(Arc<dyn FileSource>, FileDescriptor) + Send + Sync>;

/// The hidden file input behind the picker button.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickerInput {
    value: Option<String>,
}

impl PickerInput {
    pub fn accept(&self) -> &'static str {
        PICKER_ACCEPT
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    fn set(&mut self, value: String) {
        self.value = Some(value);
    }

    /// Clear the input so choosing the same file again registers as a change.
    pub fn reset(&mut self) {
        self.value = None;
    }
}

/// Result of handing a file list to the widget.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    /// No files; nothing happened beyond ending a drag.
    Empty,
    Accepted {
        file_name: String,
        size: u64,
        discarded: usize,
    },
    Failed {
        error: IntakeError,
        discarded: usize,
    },
    Busy,
}

impl SelectionOutcome {
    /// Files after the first that were ignored.
    pub fn discarded(&self) -> usize {
        match self {
            SelectionOutcome::Accepted { discarded, .. }
            | SelectionOutcome::Failed { discarded, .. } => *discarded,
            SelectionOutcome::Empty | SelectionOutcome::Busy => 0,
        }
    }
}

pub struct UploadWidget {
    session: UploadSession,
    intake: FileIntake,
    picker: PickerInput,
    on_file_upload: FileUploadCallback,
}

impl UploadWidget {
    pub fn new<F>(on_file_upload: F) -> Self
    where
        F: Fn(Arc<dyn FileSource>, FileDescriptor) + Send + Sync + 'static,
    {
        Self::with_intake(FileIntake::default(), on_file_upload)
    }

    pub fn with_intake<F>(intake: FileIntake, on_file_upload: F) -> Self
    where
        F: Fn(Arc<dyn FileSource>, FileDescriptor) + Send + Sync + 'static,
    {
        Self {
            session: UploadSession::default(),
            intake,
            picker: PickerInput::default(),
            on_file_upload: Box::new(on_file_upload),
        }
    }

    pub fn session(&self) -> &UploadSession {
        &self.session
    }

    pub fn picker(&self) -> &PickerInput {
        &self.picker
    }

    pub fn view(&self) -> WidgetView {
        WidgetView::from_session(&self.session)
    }

    fn apply(&mut self, event: UploadEvent) -> Result<(), TransitionError> {
        self.session = transition(&self.session, event)?;
        Ok(())
    }

    pub fn drag_enter(&mut self) {
        if let Err(e) = self.apply(UploadEvent::DragEnter) {
            tracing::debug!(error = %e, "Ignored drag enter");
        }
    }

    pub fn drag_leave(&mut self) {
        if let Err(e) = self.apply(UploadEvent::DragLeave) {
            tracing::debug!(error = %e, "Ignored drag leave");
        }
    }

    /// Handle a drop or picker change. Only the first file is processed.
    pub async fn select_files(&mut self, files: Vec<Arc<dyn FileSource>>) -> SelectionOutcome {
        let mut files = files.into_iter();
        let Some(source) = files.next() else {
            self.drag_leave();
            return SelectionOutcome::Empty;
        };

        let discarded = files.count();
        if discarded > 0 {
            tracing::info!(
                file_name = %source.name(),
                discarded,
                "Multiple files selected, only the first is processed"
            );
        }

        let selected = SelectedFile::from_source(source.as_ref());
        if let Err(e) = self.apply(UploadEvent::FileChosen(selected.clone())) {
            tracing::debug!(error = %e, "Selection rejected");
            return SelectionOutcome::Busy;
        }
        self.picker.set(selected.name.clone());

        let result = match self.intake.validate(&selected) {
            Ok(()) => self.intake.read(source.as_ref(), &selected).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(descriptor) => {
                let size = descriptor.size();
                if let Err(e) = self.apply(UploadEvent::IntakeSucceeded(descriptor.clone())) {
                    tracing::error!(error = %e, "Session left processing unexpectedly");
                }

                tracing::info!(
                    file_name = %selected.name,
                    size_bytes = size,
                    "File ready"
                );
                (self.on_file_upload)(source, descriptor);

                SelectionOutcome::Accepted {
                    file_name: selected.name,
                    size,
                    discarded,
                }
            }
            Err(error) => {
                tracing::warn!(
                    file_name = %selected.name,
                    kind = ?error.kind,
                    message = %error.message,
                    "File rejected"
                );
                if let Err(e) = self.apply(UploadEvent::IntakeFailed(error.clone())) {
                    tracing::error!(error = %e, "Session left processing unexpectedly");
                }

                SelectionOutcome::Failed { error, discarded }
            }
        }
    }

    /// Return to Idle and clear the picker.
    pub fn remove_file(&mut self) -> Result<(), TransitionError> {
        self.apply(UploadEvent::Remove)?;
        self.picker.reset();
        Ok(())
    }

    /// Force the widget back to Idle, e.g. after a `select_files` future was dropped mid-read.
    pub fn reset(&mut self) {
        self.session = UploadSession::default();
        self.picker.reset();
    }
}

impl std::fmt::Debug for UploadWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadWidget")
            .field("session", &self.session)
            .field("picker", &self.picker)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::IntakeErrorKind;
    use crate::source::{LocalFile, MemoryFile};
    use crate::state::UploadStatus;
    use crate::view::{InlineMessage, StatusIndicator};
    use async_trait::async_trait;
    use bytes::Bytes;
    use chrono::{DateTime, Utc};
    use sheetdrop_processing::SpreadsheetValidator;
    use std::sync::Mutex;

    type Calls = Arc<Mutex<Vec<(String, FileDescriptor)>>>;

    fn recording_widget() -> (UploadWidget, Calls) {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let widget = UploadWidget::new(move |source, descriptor| {
            sink.lock()
                .unwrap()
                .push((source.name().to_string(), descriptor));
        });
        (widget, calls)
    }

    fn csv(name: &str, body: &'static [u8]) -> Arc<dyn FileSource> {
        Arc::new(MemoryFile::new(name, "text/csv", Bytes::from_static(body)))
    }

    #[derive(Debug)]
    struct UnreadableFile;

    #[async_trait]
    impl FileSource for UnreadableFile {
        fn name(&self) -> &str {
            "locked.csv"
        }
        fn size(&self) -> u64 {
            10
        }
        fn mime_type(&self) -> &str {
            "text/csv"
        }
        fn last_modified(&self) -> DateTime<Utc> {
            Utc::now()
        }
        async fn read_all(&self) -> std::io::Result<Bytes> {
            Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "locked",
            ))
        }
    }

    #[tokio::test]
    async fn test_valid_file_reaches_success_and_fires_callback_once() {
        let (mut widget, calls) = recording_widget();

        let outcome = widget.select_files(vec![csv("data.csv", b"a,b\n1,2\n")]).await;

        assert_eq!(
            outcome,
            SelectionOutcome::Accepted {
                file_name: "data.csv".to_string(),
                size: 8,
                discarded: 0
            }
        );
        assert_eq!(widget.session().status(), UploadStatus::Success);
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "data.csv");
        assert_eq!(calls[0].1.size(), calls[0].1.content().len() as u64);
    }

    #[tokio::test]
    async fn test_first_file_wins() {
        let (mut widget, calls) = recording_widget();

        let outcome = widget
            .select_files(vec![
                csv("first.csv", b"1"),
                csv("second.csv", b"2"),
                csv("third.csv", b"3"),
            ])
            .await;

        assert_eq!(outcome.discarded(), 2);
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "first.csv");
    }

    #[tokio::test]
    async fn test_empty_drop_ends_drag() {
        let (mut widget, calls) = recording_widget();
        widget.drag_enter();
        assert!(widget.view().show_drop_overlay);

        let outcome = widget.select_files(Vec::new()).await;

        assert_eq!(outcome, SelectionOutcome::Empty);
        assert_eq!(widget.session().status(), UploadStatus::Idle);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_type_shows_inline_error() {
        let (mut widget, calls) = recording_widget();
        let file: Arc<dyn FileSource> = Arc::new(MemoryFile::new(
            "notes.txt",
            "text/plain",
            Bytes::from_static(b"hello"),
        ));

        let outcome = widget.select_files(vec![file]).await;

        assert!(matches!(
            outcome,
            SelectionOutcome::Failed { ref error, .. } if error.kind == IntakeErrorKind::InvalidType
        ));
        assert_eq!(widget.session().status(), UploadStatus::Error);
        let view = widget.view();
        assert_eq!(view.indicator, StatusIndicator::Cross);
        assert!(matches!(view.message, Some(InlineMessage::Error(_))));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_too_large_never_fires_callback() {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let mut widget = UploadWidget::with_intake(
            FileIntake::new(SpreadsheetValidator::with_max_file_size(4)),
            move |source, descriptor| {
                sink.lock()
                    .unwrap()
                    .push((source.name().to_string(), descriptor));
            },
        );

        let outcome = widget.select_files(vec![csv("big.csv", b"a,b,c,d\n")]).await;

        assert!(matches!(
            outcome,
            SelectionOutcome::Failed { ref error, .. } if error.kind == IntakeErrorKind::TooLarge
        ));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_failure() {
        let (mut widget, calls) = recording_widget();

        let file: Arc<dyn FileSource> = Arc::new(UnreadableFile);
        let outcome = widget.select_files(vec![file]).await;

        assert!(matches!(
            outcome,
            SelectionOutcome::Failed { ref error, .. } if error.kind == IntakeErrorKind::ReadFailure
        ));
        assert_eq!(widget.session().status(), UploadStatus::Error);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_then_reselect_same_file() {
        let (mut widget, calls) = recording_widget();
        let file = csv("data.csv", b"a,b\n");

        widget.select_files(vec![file.clone()]).await;
        assert_eq!(widget.picker().value(), Some("data.csv"));

        widget.remove_file().unwrap();
        assert_eq!(widget.session().status(), UploadStatus::Idle);
        assert!(widget.session().selected_file().is_none());
        assert_eq!(widget.picker().value(), None);

        widget.select_files(vec![file]).await;
        assert_eq!(widget.session().status(), UploadStatus::Success);
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_remove_when_idle_is_invalid() {
        let (mut widget, _calls) = recording_widget();
        assert!(matches!(
            widget.remove_file(),
            Err(TransitionError::Invalid { .. })
        ));
    }

    #[tokio::test]
    async fn test_new_selection_replaces_error() {
        let (mut widget, calls) = recording_widget();
        let bad: Arc<dyn FileSource> =
            Arc::new(MemoryFile::new("a.pdf", "application/pdf", Bytes::from_static(b"%PDF")));

        widget.select_files(vec![bad]).await;
        widget.select_files(vec![csv("good.csv", b"x")]).await;

        assert_eq!(widget.session().status(), UploadStatus::Success);
        assert!(widget.session().error().is_none());
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_local_file_selection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("销售数据.csv");
        std::fs::write(&path, "城市,销量\n北京,12\n").unwrap();

        let (mut widget, calls) = recording_widget();
        let file: Arc<dyn FileSource> = Arc::new(LocalFile::open(&path).await.unwrap());
        widget.select_files(vec![file]).await;

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.name(), "销售数据.csv");
        assert_eq!(
            calls[0].1.content().as_ref(),
            "城市,销量\n北京,12\n".as_bytes()
        );
    }
}
