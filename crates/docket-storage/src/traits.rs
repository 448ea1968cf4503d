//! Blob storage abstraction trait
//!
//! This module defines the `BlobStorage` trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use docket_core::models::WriteCredential;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Credential signing failed: {0}")]
    SigningFailed(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Blob storage abstraction trait
///
/// All storage backends (S3, local filesystem, in-memory) implement this trait so the
/// lifecycle orchestrator never couples to a specific backend.
///
/// **Key format:** `documents/{uuid}.{ext}`. See the crate root documentation.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Issue a time-limited credential that lets a client PUT bytes to `storage_key`.
    ///
    /// Issuing a credential does not create the object.
    async fn issue_write_credential(
        &self,
        storage_key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<WriteCredential>;

    /// Check if an object exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Size of an object in bytes, read from its metadata. Returns `StorageError::NotFound`
    /// when absent.
    async fn size(&self, storage_key: &str) -> StorageResult<u64>;

    /// Fetch the full object. Returns `StorageError::NotFound` when absent.
    async fn fetch(&self, storage_key: &str) -> StorageResult<Bytes>;

    /// Write an object directly. Used by the local backend's upload endpoint.
    async fn put(&self, storage_key: &str, data: Vec<u8>, content_type: &str)
        -> StorageResult<()>;

    /// Delete an object. Deleting an absent key succeeds.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

/// Compute the absolute expiry of a credential issued now.
pub(crate) fn expiry_from_now(expires_in: Duration) -> StorageResult<chrono::DateTime<chrono::Utc>> {
    let delta = chrono::Duration::from_std(expires_in)
        .map_err(|e| StorageError::ConfigError(format!("Invalid credential expiry: {}", e)))?;
    Ok(chrono::Utc::now() + delta)
}
