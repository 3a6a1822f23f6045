use sheetdrop_core::constants::{
    ACCEPTED_CONTENT_TYPES, ACCEPTED_EXTENSIONS, MAX_UPLOAD_SIZE_BYTES,
};

/// Validation errors for tabular data files
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Unsupported file type: '{filename}' ({content_type}); only CSV and Excel (.xlsx/.xls) files are accepted")]
    InvalidType {
        filename: String,
        content_type: String,
    },
}

/// Spreadsheet file validator
///
/// A file is accepted when EITHER its reported content type OR its file name
/// extension is recognized; browsers often report an empty or generic MIME
/// type for CSV files, so neither check alone is authoritative.
#[derive(Debug, Clone)]
pub struct SpreadsheetValidator {
    max_file_size: u64,
    allowed_extensions: Vec<String>,
    allowed_content_types: Vec<String>,
}

impl Default for SpreadsheetValidator {
    fn default() -> Self {
        Self::new(
            MAX_UPLOAD_SIZE_BYTES,
            ACCEPTED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            ACCEPTED_CONTENT_TYPES.iter().map(|s| s.to_string()).collect(),
        )
    }
}

impl SpreadsheetValidator {
    pub fn new(
        max_file_size: u64,
        allowed_extensions: Vec<String>,
        allowed_content_types: Vec<String>,
    ) -> Self {
        Self {
            max_file_size,
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|ct| ct.to_lowercase())
                .collect(),
        }
    }

    /// Spreadsheet rules with a custom size ceiling.
    pub fn with_max_file_size(max_file_size: u64) -> Self {
        Self {
            max_file_size,
            ..Self::default()
        }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Validate file size. Empty files are accepted.
    pub fn validate_file_size(&self, size: u64) -> Result<(), ValidationError> {
        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Whether the lowercased file name ends in an accepted extension.
    pub fn has_accepted_extension(&self, filename: &str) -> bool {
        let lowered = filename.to_lowercase();
        match lowered.rsplit_once('.') {
            Some((_, extension)) => self.allowed_extensions.iter().any(|e| e == extension),
            None => false,
        }
    }

    /// Whether the content type (parameters ignored) is an accepted MIME type.
    pub fn has_accepted_content_type(&self, content_type: &str) -> bool {
        let normalized = normalize_mime_type(content_type).to_lowercase();
        !normalized.is_empty() && self.allowed_content_types.iter().any(|ct| ct == &normalized)
    }

    /// Validate file type: content type OR extension must be recognized.
    pub fn validate_type(&self, filename: &str, content_type: &str) -> Result<(), ValidationError> {
        if self.has_accepted_content_type(content_type) || self.has_accepted_extension(filename) {
            return Ok(());
        }

        tracing::debug!(
            filename = %filename,
            content_type = %content_type,
            "Rejected file with unrecognized extension and content type"
        );

        Err(ValidationError::InvalidType {
            filename: filename.to_string(),
            content_type: if content_type.is_empty() {
                "unknown type".to_string()
            } else {
                content_type.to_string()
            },
        })
    }

    /// Validate type, then size.
    pub fn validate_all(
        &self,
        filename: &str,
        content_type: &str,
        file_size: u64,
    ) -> Result<(), ValidationError> {
        self.validate_type(filename, content_type)?;
        self.validate_file_size(file_size)?;
        Ok(())
    }
}

/// Normalize MIME type by stripping parameters (e.g. "text/csv; charset=utf-8" -> "text/csv").
fn normalize_mime_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
}
