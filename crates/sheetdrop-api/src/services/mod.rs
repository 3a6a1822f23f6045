pub mod ingest;

pub use ingest::{IncomingFile, IngestService};
