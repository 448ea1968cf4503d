//! In-memory blob storage for tests and local development

use crate::traits::{expiry_from_now, BlobStorage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use docket_core::models::WriteCredential;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Blob storage that keeps objects in a map.
///
/// Individual operations can be made to fail to exercise partial-failure paths.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fail_credentials: Arc<AtomicBool>,
    fail_fetches: Arc<AtomicBool>,
    fail_deletes: Arc<AtomicBool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn files(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A poisoned map is still consistent: every critical section is a single insert/remove.
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Set an object, as if a client had uploaded it
    pub fn set_file(&self, key: &str, data: Vec<u8>) {
        self.files().insert(key.to_string(), data);
    }

    /// Check if an object exists (for test assertions)
    pub fn has_file(&self, key: &str) -> bool {
        self.files().contains_key(key)
    }

    pub fn file_count(&self) -> usize {
        self.files().len()
    }

    pub fn set_fail_credentials(&self, fail: bool) {
        self.fail_credentials.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStorage for MemoryStorage {
    async fn issue_write_credential(
        &self,
        storage_key: &str,
        _content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<WriteCredential> {
        if self.fail_credentials.load(Ordering::SeqCst) {
            return Err(StorageError::SigningFailed(
                "injected credential failure".to_string(),
            ));
        }
        Ok(WriteCredential {
            url: format!("memory://upload/{}", storage_key),
            method: "PUT".to_string(),
            expires_at: expiry_from_now(expires_in)?,
        })
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.has_file(storage_key))
    }

    async fn size(&self, storage_key: &str) -> StorageResult<u64> {
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(StorageError::BackendError(
                "injected head failure".to_string(),
            ));
        }
        self.files()
            .get(storage_key)
            .map(|data| data.len() as u64)
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn fetch(&self, storage_key: &str) -> StorageResult<Bytes> {
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(StorageError::DownloadFailed(
                "injected fetch failure".to_string(),
            ));
        }
        self.files()
            .get(storage_key)
            .map(|data| Bytes::from(data.clone()))
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn put(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<()> {
        self.set_file(storage_key, data);
        Ok(())
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::DeleteFailed(
                "injected delete failure".to_string(),
            ));
        }
        self.files().remove(storage_key);
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
