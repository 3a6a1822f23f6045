//! Application state shared by all handlers.

use sheetdrop_core::Config;
use sheetdrop_storage::Storage;
use std::sync::Arc;

/// Read-only process-wide state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
}

impl AppState {
    pub fn new(config: Config, storage: Arc<dyn Storage>) -> Self {
        Self { config, storage }
    }
}
