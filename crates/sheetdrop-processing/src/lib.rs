//! File-identity checks for tabular uploads.
//!
//! Everything here is pure and shared by the client widget and the ingestion
//! server: type and size rules, leading-byte signature sniffing, and the
//! filename rules used when a file is committed to disk.

pub mod filename;
pub mod signature;
pub mod validator;

pub use filename::{sanitize_original_name, synthesize_name};
pub use signature::{sniff, SpreadsheetFormat, SNIFF_LEN};
pub use validator::{SpreadsheetValidator, ValidationError};
