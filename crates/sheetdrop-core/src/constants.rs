//! Upload rules shared by the client widget and the ingestion endpoint.
//!
//! Both sides must agree on what a tabular data file is, so the accepted
//! types and the size ceiling live here and nowhere else.

/// Maximum upload size in bytes (100 MiB).
pub const MAX_UPLOAD_SIZE_BYTES: u64 = 100 * 1024 * 1024;

/// Accepted file extensions, lowercase, without the leading dot.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["csv", "xlsx", "xls"];

pub const MIME_CSV: &str = "text/csv";
pub const MIME_XLS: &str = "application/vnd.ms-excel";
pub const MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Accepted MIME types as reported by the client.
pub const ACCEPTED_CONTENT_TYPES: &[&str] = &[MIME_CSV, MIME_XLS, MIME_XLSX];

/// Name of the multipart field carrying the file.
pub const FILE_FIELD_NAME: &str = "file";

/// Default ingestion route.
pub const DEFAULT_UPLOAD_ROUTE: &str = "/api/upload";

/// Value for a file picker's `accept` attribute.
pub const PICKER_ACCEPT: &str = ".csv,.xlsx,.xls,application/vnd.ms-excel,application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Extension to use for a given accepted MIME type (used when a name has to be synthesized).
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let normalized = content_type
        .split(';')
        .next()
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_default();
    match normalized.as_str() {
        MIME_CSV => Some("csv"),
        MIME_XLS => Some("xls"),
        MIME_XLSX => Some("xlsx"),
        _ => None,
    }
}

/// MIME type implied by a file name's extension, for files reported without one.
pub fn content_type_for_file_name(file_name: &str) -> Option<&'static str> {
    let (_, extension) = file_name.rsplit_once('.')?;
    match extension.to_lowercase().as_str() {
        "csv" => Some(MIME_CSV),
        "xls" => Some(MIME_XLS),
        "xlsx" => Some(MIME_XLSX),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_for_known_content_types() {
        assert_eq!(extension_for_content_type("text/csv"), Some("csv"));
        assert_eq!(extension_for_content_type("TEXT/CSV; charset=utf-8"), Some("csv"));
        assert_eq!(extension_for_content_type(MIME_XLSX), Some("xlsx"));
        assert_eq!(extension_for_content_type(MIME_XLS), Some("xls"));
    }

    #[test]
    fn extension_for_unknown_content_type() {
        assert_eq!(extension_for_content_type("text/plain"), None);
        assert_eq!(extension_for_content_type(""), None);
    }

    #[test]
    fn content_type_from_file_name() {
        assert_eq!(content_type_for_file_name("data.csv"), Some(MIME_CSV));
        assert_eq!(content_type_for_file_name("Report.XLSX"), Some(MIME_XLSX));
        assert_eq!(content_type_for_file_name("legacy.xls"), Some(MIME_XLS));
        assert_eq!(content_type_for_file_name("notes.txt"), None);
        assert_eq!(content_type_for_file_name("no_extension"), None);
    }

    #[test]
    fn picker_accept_lists_every_extension() {
        for ext in ACCEPTED_EXTENSIONS {
            assert!(PICKER_ACCEPT.contains(&format!(".{}", ext)));
        }
    }
}
