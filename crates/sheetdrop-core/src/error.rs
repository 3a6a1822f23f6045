//! Error types module
//!
//! All server-side failures are unified under `AppError`. Each variant
//! self-describes how it is presented over HTTP through `ErrorMetadata`.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like oversized uploads
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "NO_FILE_PART")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details are withheld from the response body
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("No file uploaded")]
    NoFilePart,

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Malformed upload: {0}")]
    MalformedUpload(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::NoFilePart => (
            400,
            "NO_FILE_PART",
            false,
            Some("Send the file in a multipart field named 'file'"),
            false,
            LogLevel::Debug,
        ),
        AppError::MethodNotAllowed(_) => (
            405,
            "METHOD_NOT_ALLOWED",
            false,
            Some("Use POST to upload files"),
            false,
            LogLevel::Debug,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "FILE_TOO_LARGE",
            false,
            Some("Reduce file size below the upload limit"),
            false,
            LogLevel::Warn,
        ),
        AppError::UnsupportedFileType(_) => (
            415,
            "INVALID_TYPE",
            false,
            Some("Upload a CSV or Excel (.xlsx/.xls) file"),
            false,
            LogLevel::Debug,
        ),
        AppError::MalformedUpload(_) => (
            500,
            "MALFORMED_UPLOAD",
            false,
            Some("Check the multipart encoding of the request"),
            false,
            LogLevel::Warn,
        ),
        AppError::Storage(_) => (
            500,
            "STORAGE_FAILURE",
            true,
            Some("Retry after a short delay"),
            false,
            LogLevel::Error,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::NoFilePart => "NoFilePart",
            AppError::MethodNotAllowed(_) => "WrongMethod",
            AppError::PayloadTooLarge(_) => "TooLarge",
            AppError::UnsupportedFileType(_) => "InvalidType",
            AppError::MalformedUpload(_) => "MalformedUpload",
            AppError::Storage(_) => "StorageFailure",
            AppError::InvalidInput(_) => "InvalidInput",
        }
    }

    /// Diagnostic text for the `details` field of an error response.
    pub fn detailed_message(&self) -> String {
        self.to_string()
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::NoFilePart => "No file uploaded".to_string(),
            AppError::MethodNotAllowed(_) => "Method not allowed".to_string(),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::UnsupportedFileType(ref msg) => msg.clone(),
            AppError::MalformedUpload(_) => "File upload failed".to_string(),
            AppError::Storage(_) => "File upload failed".to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
        }
    }
}
