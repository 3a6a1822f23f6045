//! SheetDrop Core Library
//!
//! This crate provides the domain model, error types, shared upload rules, and
//! configuration used by both the client-side widget and the ingestion server.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{CollisionPolicy, Config, LogFormat};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{DescriptorError, FileDescriptor, StoredFile, UploadResponse};
