//! Application state and sub-state extractors.
//!
//! AppState is split into sub-states so handlers can extract only what they need via
//! Axum's `FromRef`.

use std::sync::Arc;

use docket_core::Config;
use docket_storage::BlobStorage;

use crate::services::DocumentLifecycleService;

/// Lifecycle orchestrator shared by the document and search handlers.
#[derive(Clone)]
pub struct DocumentState {
    pub service: Arc<DocumentLifecycleService>,
}

/// Direct blob uploads against the local backend.
#[derive(Clone)]
pub struct BlobState {
    pub storage: Arc<dyn BlobStorage>,
    /// Resolves the record that owns an uploaded key
    pub service: Arc<DocumentLifecycleService>,
    /// Only the local and in-memory backends accept bytes through the API
    pub direct_upload_enabled: bool,
    pub max_document_size: usize,
}

/// Main application state: aggregates sub-states for dependency injection.
#[derive(Clone)]
pub struct AppState {
    pub documents: DocumentState,
    pub blobs: BlobState,
    pub config: Config,
    pub is_production: bool,
}

impl AppState {
    pub fn new(
        config: Config,
        service: Arc<DocumentLifecycleService>,
        storage: Arc<dyn BlobStorage>,
    ) -> Self {
        let direct_upload_enabled = storage.backend_type() != docket_core::StorageBackend::S3;
        Self {
            documents: DocumentState {
                service: service.clone(),
            },
            blobs: BlobState {
                storage,
                service,
                direct_upload_enabled,
                max_document_size: config.max_document_size_bytes(),
            },
            is_production: config.is_production(),
            config,
        }
    }
}

// ----- FromRef for sub-state extraction -----

impl axum::extract::FromRef<Arc<AppState>> for DocumentState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.documents.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for BlobState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.blobs.clone()
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
