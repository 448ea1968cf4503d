//! Service wiring: adapters, content pipeline, and the lifecycle orchestrator

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use docket_core::Config;
use docket_db::{DocumentRepository, PgVectorIndex};
use docket_processing::{create_embedding_provider, DefaultPipeline, DocumentTextExtractor};
use docket_storage::BlobStorage;

use crate::services::{DocumentLifecycleService, UploadPolicy};
use crate::setup::database::DatabasePools;
use crate::state::AppState;

/// Upload rules taken from configuration.
pub fn upload_policy(config: &Config) -> UploadPolicy {
    UploadPolicy {
        allowed_extensions: config.document_allowed_extensions().to_vec(),
        upload_url_expiry: Duration::from_secs(config.upload_url_expiry_secs()),
        max_document_size: config.max_document_size_bytes() as u64,
    }
}

/// Build the Postgres-backed adapters and the application state.
pub fn initialize_services(
    config: &Config,
    pools: DatabasePools,
    storage: Arc<dyn BlobStorage>,
) -> Result<Arc<AppState>> {
    let records = Arc::new(DocumentRepository::new(pools.records));
    let index = Arc::new(PgVectorIndex::new(pools.index, config.embedding_dim()));

    let embedder = create_embedding_provider(config)?;
    let pipeline = Arc::new(DefaultPipeline::new(
        Arc::new(DocumentTextExtractor::new()),
        embedder,
    ));

    let service = Arc::new(DocumentLifecycleService::new(
        records,
        storage.clone(),
        index,
        pipeline,
        upload_policy(config),
    ));

    tracing::info!(
        allowed_extensions = %config.document_allowed_extensions().join(","),
        embedding_provider = %config.embedding_provider(),
        embedding_dim = config.embedding_dim(),
        "Document lifecycle service initialized"
    );

    Ok(Arc::new(AppState::new(config.clone(), service, storage)))
}
