//! SheetDrop Storage Library
//!
//! Storage abstraction for ingested files and its local filesystem
//! implementation.
//!
//! # Write protocol
//!
//! An upload is first streamed to a uniquely named temp file (`.<uuid>.part`)
//! inside the upload directory, then committed under its final name with a
//! single rename. A staged file that is dropped without being committed is
//! removed, so a partial upload never appears under a committed name.

pub mod local;
pub(crate) mod naming;
pub mod traits;

// Re-export commonly used types
pub use local::LocalStorage;
pub use sheetdrop_core::CollisionPolicy;
pub use traits::{StagedFile, Storage, StorageError, StorageResult};
