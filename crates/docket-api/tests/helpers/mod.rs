//! Test helpers: wire the lifecycle service and router over in-memory adapters.
//!
//! Run from workspace root: `cargo test -p docket-api`. Postgres-backed tests are
//! `#[ignore]` and need Docker: `cargo test -p docket-api -- --ignored`.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use docket_api::setup::routes;
use docket_api::{AppState, DocumentLifecycleService, UploadPolicy};
use docket_core::config::DocketConfig;
use docket_core::{Config, StorageBackend};
use docket_db::{ContentIndex, InMemoryContentIndex, InMemoryRecordStore, RecordStore};
use docket_processing::{
    ContentPipeline, DefaultPipeline, DocumentTextExtractor, EmbeddingInput, EmbeddingProvider,
    HashingEmbedder, PipelineError, PipelineResult,
};
use docket_storage::{BlobStorage, MemoryStorage};

pub const TEST_EMBEDDING_DIM: usize = 256;

pub const TEST_MAX_DOCUMENT_SIZE: u64 = 1024 * 1024;

/// API path prefix for tests (e.g. `/api/v1/documents`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", docket_api::constants::API_PREFIX, path)
}

pub fn test_policy() -> UploadPolicy {
    UploadPolicy {
        allowed_extensions: vec!["pdf".to_string(), "txt".to_string(), "md".to_string()],
        upload_url_expiry: Duration::from_secs(3600),
        max_document_size: TEST_MAX_DOCUMENT_SIZE,
    }
}

pub fn test_config() -> Config {
    let mut config = DocketConfig::default();
    config.storage_backend = Some(StorageBackend::Memory);
    config.local_storage_path = None;
    config.embedding_provider = "hashing".to_string();
    config.embedding_dim = TEST_EMBEDDING_DIM;
    Config(Box::new(config))
}

pub fn hashing_pipeline() -> Arc<dyn ContentPipeline> {
    Arc::new(DefaultPipeline::new(
        Arc::new(DocumentTextExtractor::new()),
        Arc::new(HashingEmbedder::new(TEST_EMBEDDING_DIM)),
    ))
}

/// Embedding provider that always fails.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    fn model_name(&self) -> &str {
        "failing"
    }

    fn dimension(&self) -> usize {
        TEST_EMBEDDING_DIM
    }

    async fn embed(&self, _text: &str, _input: EmbeddingInput) -> PipelineResult<Vec<f32>> {
        Err(PipelineError::Embedding("provider unavailable".to_string()))
    }
}

/// Lifecycle service over in-memory adapters, with handles for inspection and fault injection.
pub struct Harness {
    pub service: Arc<DocumentLifecycleService>,
    pub records: InMemoryRecordStore,
    pub storage: MemoryStorage,
    pub index: InMemoryContentIndex,
}

type WrapRecords = Box<dyn FnOnce(InMemoryRecordStore) -> Arc<dyn RecordStore>>;
type WrapStorage = Box<dyn FnOnce(MemoryStorage) -> Arc<dyn BlobStorage>>;

impl Harness {
    pub fn new() -> Self {
        Self::build(None, None, hashing_pipeline())
    }

    /// Route record store calls through a wrapper around `self.records`.
    pub fn with_record_store(
        wrap: impl FnOnce(InMemoryRecordStore) -> Arc<dyn RecordStore> + 'static,
    ) -> Self {
        Self::build(Some(Box::new(wrap)), None, hashing_pipeline())
    }

    /// Route blob storage calls through a wrapper around `self.storage`.
    pub fn with_storage(
        wrap: impl FnOnce(MemoryStorage) -> Arc<dyn BlobStorage> + 'static,
    ) -> Self {
        Self::build(None, Some(Box::new(wrap)), hashing_pipeline())
    }

    pub fn with_pipeline(pipeline: Arc<dyn ContentPipeline>) -> Self {
        Self::build(None, None, pipeline)
    }

    fn build(
        wrap_records: Option<WrapRecords>,
        wrap_storage: Option<WrapStorage>,
        pipeline: Arc<dyn ContentPipeline>,
    ) -> Self {
        let records = InMemoryRecordStore::new();
        let storage = MemoryStorage::new();
        let index = InMemoryContentIndex::new();

        let record_store: Arc<dyn RecordStore> = match wrap_records {
            Some(wrap) => wrap(records.clone()),
            None => Arc::new(records.clone()),
        };
        let blob_storage: Arc<dyn BlobStorage> = match wrap_storage {
            Some(wrap) => wrap(storage.clone()),
            None => Arc::new(storage.clone()),
        };

        let service = Arc::new(DocumentLifecycleService::new(
            record_store,
            blob_storage,
            Arc::new(index.clone()) as Arc<dyn ContentIndex>,
            pipeline,
            test_policy(),
        ));

        Self {
            service,
            records,
            storage,
            index,
        }
    }

    /// Begin an upload and write `bytes` to the issued key, as a client would.
    pub async fn upload(&self, filename: &str, bytes: &[u8]) -> (i64, String) {
        let slot = self
            .service
            .begin_upload(filename, Some("text/plain"))
            .await
            .expect("begin upload");
        self.storage.set_file(&slot.storage_key, bytes.to_vec());
        (slot.id, slot.storage_key)
    }

    /// Upload, confirm, and analyze a document.
    pub async fn parsed(&self, filename: &str, bytes: &[u8]) -> i64 {
        let (id, _) = self.upload(filename, bytes).await;
        self.service.confirm_upload(id).await.expect("confirm");
        self.service.analyze(id).await.expect("analyze");
        id
    }

    pub fn server(&self) -> TestServer {
        let state = Arc::new(AppState::new(
            test_config(),
            self.service.clone(),
            Arc::new(self.storage.clone()),
        ));
        TestServer::new(routes::build_router(state)).expect("Failed to create test server")
    }
}
