//! Adapter traits for the record store and the content index

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docket_core::models::{DocumentRecord, DocumentStatus, DocumentUpdate, NewDocument};
use docket_core::AppError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persistence for document records.
///
/// Same-id serialization comes only from `conditional_update`; implementations hold no
/// lock across calls.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new record in `PRE_SIGNED` state.
    async fn create(&self, new: NewDocument) -> Result<DocumentRecord, AppError>;

    async fn get(&self, id: i64) -> Result<Option<DocumentRecord>, AppError>;

    async fn find_by_storage_key(
        &self,
        storage_key: &str,
    ) -> Result<Option<DocumentRecord>, AppError>;

    /// Apply `update` only if the record is currently in `expected`.
    ///
    /// Fails `AppError::NotFound` if the record is gone and `AppError::Conflict` if its
    /// status is no longer `expected`.
    async fn conditional_update(
        &self,
        id: i64,
        expected: DocumentStatus,
        update: DocumentUpdate,
    ) -> Result<DocumentRecord, AppError>;

    /// Remove a record. Fails `AppError::NotFound` if absent.
    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// Remove a record only if it is still in `expected`.
    ///
    /// Fails `AppError::NotFound` if the record is gone and `AppError::Conflict` if its
    /// status moved on.
    async fn delete_if(&self, id: i64, expected: DocumentStatus) -> Result<(), AppError>;

    /// Page of records ordered by id ascending, plus the total record count.
    async fn list(&self, offset: i64, limit: i64)
        -> Result<(Vec<DocumentRecord>, i64), AppError>;
}

/// Content index errors
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Index database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index backend error: {0}")]
    Backend(String),
}

pub type IndexResult<T> = Result<T, IndexError>;

/// An extracted, embedded document ready for similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub index_ref: String,
    pub document_id: i64,
    pub filename: String,
    pub content: String,
    pub embedding: Vec<f32>,
    pub model_name: String,
    pub metadata: serde_json::Value,
}

/// A ranked similarity match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMatch {
    pub index_ref: String,
    pub document_id: i64,
    pub filename: String,
    pub content: String,
    /// Cosine similarity in [-1, 1], higher is closer
    pub score: f32,
    pub indexed_at: DateTime<Utc>,
}

/// Vector/search index over extracted document content.
#[async_trait]
pub trait ContentIndex: Send + Sync {
    /// Insert or replace the entry stored under `entry.index_ref`.
    async fn upsert(&self, entry: IndexEntry) -> IndexResult<()>;

    /// Remove an entry. Removing an absent entry succeeds.
    async fn delete(&self, index_ref: &str) -> IndexResult<()>;

    /// Nearest entries to `vector`, best first.
    async fn search(&self, vector: Vec<f32>, top_k: usize) -> IndexResult<Vec<IndexMatch>>;

    /// Whether an entry exists under `index_ref`.
    async fn contains(&self, index_ref: &str) -> IndexResult<bool>;
}
