//! Leading-byte signature sniffing.
//!
//! The server cannot trust the client's type check, so it looks at the first
//! bytes of what actually arrived. The content is never parsed.

use sheetdrop_core::constants::{MIME_CSV, MIME_XLS, MIME_XLSX};

/// Number of leading bytes inspected by [`sniff`].
pub const SNIFF_LEN: usize = 8 * 1024;

const ZIP_LOCAL_HEADER: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_ARCHIVE: &[u8] = b"PK\x05\x06";
const OLE2_HEADER: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    /// Delimited text
    Csv,
    /// Office Open XML workbook (ZIP container)
    Xlsx,
    /// Legacy BIFF workbook (OLE2 compound file)
    Xls,
}

impl SpreadsheetFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SpreadsheetFormat::Csv => "csv",
            SpreadsheetFormat::Xlsx => "xlsx",
            SpreadsheetFormat::Xls => "xls",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            SpreadsheetFormat::Csv => MIME_CSV,
            SpreadsheetFormat::Xlsx => MIME_XLSX,
            SpreadsheetFormat::Xls => MIME_XLS,
        }
    }

    /// Whether content of this format may carry the given file extension.
    ///
    /// `.xls` accepts any format since spreadsheet tools routinely export
    /// text or OOXML under that name. Unknown extensions are not judged.
    pub fn is_compatible_with_extension(&self, extension: &str) -> bool {
        match extension.trim_start_matches('.').to_lowercase().as_str() {
            "csv" => *self == SpreadsheetFormat::Csv,
            "xlsx" => *self == SpreadsheetFormat::Xlsx,
            _ => true,
        }
    }
}

/// Identify a spreadsheet format from the leading bytes of a file.
///
/// Text is recognized by the absence of NUL bytes and a low share of other
/// control bytes, so legacy-encoded CSV exports (GBK, Latin-1) still pass.
/// An empty head is an empty CSV.
pub fn sniff(head: &[u8]) -> Option<SpreadsheetFormat> {
    if head.starts_with(ZIP_LOCAL_HEADER) || head.starts_with(ZIP_EMPTY_ARCHIVE) {
        return Some(SpreadsheetFormat::Xlsx);
    }
    if head.starts_with(OLE2_HEADER) {
        return Some(SpreadsheetFormat::Xls);
    }
    if looks_like_text(head) {
        return Some(SpreadsheetFormat::Csv);
    }
    None
}

fn looks_like_text(head: &[u8]) -> bool {
    let head = &head[..head.len().min(SNIFF_LEN)];
    if head.contains(&0) {
        return false;
    }

    let control = head
        .iter()
        .filter(|&&b| (b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r' | 0x0C)) || b == 0x7F)
        .count();

    // at most 1% stray control bytes
    control * 100 <= head.len()
}
