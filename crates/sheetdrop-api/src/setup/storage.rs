//! Storage setup and initialization

use anyhow::{Context, Result};
use sheetdrop_core::Config;
use sheetdrop_storage::{LocalStorage, Storage};
use std::sync::Arc;

/// Create the upload directory eagerly so a misconfigured path fails at startup.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage = LocalStorage::new(config.upload_dir.clone(), config.collision_policy);
    let root = storage
        .ensure_ready()
        .await
        .with_context(|| format!("Upload directory {} is not usable", config.upload_dir.display()))?;

    tracing::info!(
        upload_dir = %root.display(),
        collision_policy = %config.collision_policy,
        "Local storage initialized"
    );

    Ok(Arc::new(storage))
}
