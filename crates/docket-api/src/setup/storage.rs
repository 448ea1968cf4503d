//! Storage setup and initialization

use anyhow::Result;
use docket_core::Config;
use docket_storage::{create_storage, BlobStorage};
use std::sync::Arc;

/// Setup the blob storage backend selected by `STORAGE_BACKEND`.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn BlobStorage>> {
    tracing::info!("Initializing blob storage...");
    let storage = create_storage(config).await?;
    tracing::info!(
        backend = %storage.backend_type(),
        upload_url_expiry_secs = config.upload_url_expiry_secs(),
        "Blob storage initialized successfully"
    );
    Ok(storage)
}
