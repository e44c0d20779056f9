use crate::config::TransferConfig;
use crate::services::storage::{LocalStorageService, StorageService};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn setup_storage(config: &TransferConfig) -> Arc<LocalStorageService> {
    let storage = LocalStorageService::new(config.storage_dir.clone());

    info!("📂 Storage directory: {}", storage.root().display());

    // Uploads create the directory on demand as well, so a failure here is not fatal.
    match storage.ensure_root().await {
        Ok(()) => match storage.list().await {
            Ok(files) => info!("✅ Storage ready with {} file(s)", files.len()),
            Err(e) => warn!("⚠️  Storage directory is not listable yet: {}", e),
        },
        Err(e) => warn!(
            "⚠️  Could not create storage directory {}: {}",
            storage.root().display(),
            e
        ),
    }

    Arc::new(storage)
}
