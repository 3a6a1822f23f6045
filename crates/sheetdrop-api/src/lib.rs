//! SheetDrop API Library
//!
//! This crate provides the ingestion endpoint, error rendering, telemetry, and
//! application setup for the upload server.

pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
