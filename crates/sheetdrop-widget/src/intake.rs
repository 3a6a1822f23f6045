//! Pre-flight validation and content read.

use sheetdrop_core::FileDescriptor;
use sheetdrop_processing::{SpreadsheetValidator, ValidationError};

use crate::source::FileSource;
use crate::state::SelectedFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeErrorKind {
    /// Neither the MIME type nor the extension is a spreadsheet type.
    InvalidType,
    /// Reported size exceeds the limit.
    TooLarge,
    /// Local I/O failed or fewer/more bytes were read than reported.
    ReadFailure,
}

/// A user-facing intake failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct IntakeError {
    pub kind: IntakeErrorKind,
    pub message: String,
}

impl IntakeError {
    pub fn new(kind: IntakeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn read_failure() -> Self {
        Self::new(IntakeErrorKind::ReadFailure, "Failed to read the file, please try again")
    }
}

impl From<ValidationError> for IntakeError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidType { .. } => IntakeError::new(
                IntakeErrorKind::InvalidType,
                "Only CSV and Excel (.xlsx/.xls) files are supported",
            ),
            ValidationError::FileTooLarge { max, .. } => IntakeError::new(
                IntakeErrorKind::TooLarge,
                format!("File size cannot exceed {}MB", max / 1024 / 1024),
            ),
        }
    }
}

/// Validator + reader for one selected file.
#[derive(Debug, Clone, Default)]
pub struct FileIntake {
    validator: SpreadsheetValidator,
}

impl FileIntake {
    pub fn new(validator: SpreadsheetValidator) -> Self {
        Self { validator }
    }

    /// Type check, then size check. Nothing is read.
    pub fn validate(&self, file: &SelectedFile) -> Result<(), IntakeError> {
        self.validator
            .validate_all(&file.name, &file.mime_type, file.size)
            .map_err(IntakeError::from)
    }

    /// Read the whole file and build its descriptor.
    pub async fn read(
        &self,
        source: &dyn FileSource,
        file: &SelectedFile,
    ) -> Result<FileDescriptor, IntakeError> {
        let content = source.read_all().await.map_err(|e| {
            tracing::warn!(file_name = %file.name, error = %e, "File read failed");
            IntakeError::read_failure()
        })?;

        FileDescriptor::new(
            file.name.clone(),
            file.size,
            file.mime_type.clone(),
            file.last_modified,
            content,
        )
        .map_err(|e| {
            tracing::warn!(file_name = %file.name, error = %e, "File changed while reading");
            IntakeError::read_failure()
        })
    }

    pub async fn process(&self, source: &dyn FileSource) -> Result<FileDescriptor, IntakeError> {
        let file = SelectedFile::from_source(source);
        self.validate(&file)?;
        self.read(source, &file).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryFile;
    use async_trait::async_trait;
    use bytes::Bytes;
    use chrono::{DateTime, Utc};

    #[derive(Debug)]
    struct LyingSource {
        reported: u64,
    }

    #[async_trait]
    impl FileSource for LyingSource {
        fn name(&self) -> &str {
            "data.csv"
        }
        fn size(&self) -> u64 {
            self.reported
        }
        fn mime_type(&self) -> &str {
            "text/csv"
        }
        fn last_modified(&self) -> DateTime<Utc> {
            Utc::now()
        }
        async fn read_all(&self) -> std::io::Result<Bytes> {
            Ok(Bytes::from_static(b"a,b\n"))
        }
    }

    #[tokio::test]
    async fn test_accepts_csv_by_extension() {
        let source = MemoryFile::new("report.csv", "", Bytes::from_static(b"a,b\n1,2\n"));
        let descriptor = FileIntake::default().process(&source).await.unwrap();
        assert_eq!(descriptor.name(), "report.csv");
        assert_eq!(descriptor.size(), 8);
        assert_eq!(descriptor.content().len(), 8);
    }

    #[tokio::test]
    async fn test_rejects_text_file() {
        let source = MemoryFile::new("notes.txt", "text/plain", Bytes::from_static(b"hello"));
        let err = FileIntake::default().process(&source).await.unwrap_err();
        assert_eq!(err.kind, IntakeErrorKind::InvalidType);
        assert!(err.message.contains("CSV"));
    }

    #[tokio::test]
    async fn test_rejects_oversized_before_reading() {
        let intake = FileIntake::new(SpreadsheetValidator::with_max_file_size(4));
        let source = MemoryFile::new("big.csv", "text/csv", Bytes::from_static(b"a,b,c\n"));
        let err = intake.process(&source).await.unwrap_err();
        assert_eq!(err.kind, IntakeErrorKind::TooLarge);
    }

    #[tokio::test]
    async fn test_too_large_message_names_limit() {
        let err = IntakeError::from(ValidationError::FileTooLarge {
            size: 200 * 1024 * 1024,
            max: 100 * 1024 * 1024,
        });
        assert_eq!(err.message, "File size cannot exceed 100MB");
    }

    #[tokio::test]
    async fn test_size_mismatch_is_read_failure() {
        let source = LyingSource { reported: 10 };
        let err = FileIntake::default().process(&source).await.unwrap_err();
        assert_eq!(err.kind, IntakeErrorKind::ReadFailure);
    }
}
