use crate::traits::{expiry_from_now, BlobStorage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use docket_core::models::WriteCredential;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
///
/// Write credentials point at the API's own `PUT /api/v1/blobs/{key}` endpoint, which
/// stores the request body through [`BlobStorage::put`].
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/docket/blobs")
    /// * `base_url` - Base URL of the upload endpoint (e.g., "http://localhost:3000/api/v1/blobs")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Convert storage key to filesystem path with path traversal checks
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty() || storage_key.contains("..") || storage_key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let path = self.base_path.join(storage_key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        // Existing files may be symlinks; resolve and re-check containment.
        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        } else if path.strip_prefix(&self.base_path).is_err() {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(path)
    }

    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStorage for LocalStorage {
    async fn issue_write_credential(
        &self,
        storage_key: &str,
        _content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<WriteCredential> {
        self.key_to_path(storage_key)?;
        Ok(WriteCredential {
            url: self.generate_url(storage_key),
            method: "PUT".to_string(),
            expires_at: expiry_from_now(expires_in)?,
        })
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn size(&self, storage_key: &str) -> StorageResult<u64> {
        let path = self.key_to_path(storage_key)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::IoError(e)),
        }
    }

    async fn fetch(&self, storage_key: &str) -> StorageResult<Bytes> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(storage_key.to_string()));
            }
            Err(e) => {
                return Err(StorageError::DownloadFailed(format!(
                    "Failed to read file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage fetch successful"
        );

        Ok(Bytes::from(data))
    }

    async fn put(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage put successful"
        );

        Ok(())
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    path.display(),
                    e
                )));
            }
        }

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn storage(dir: &Path) -> LocalStorage {
        LocalStorage::new(dir, "http://localhost:3000/api/v1/blobs".to_string())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_local_storage_put_fetch() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage
            .put("documents/a.txt", b"hello world".to_vec(), "text/plain")
            .await
            .unwrap();

        assert_eq!(
            &storage.fetch("documents/a.txt").await.unwrap()[..],
            b"hello world"
        );
        assert!(storage.exists("documents/a.txt").await.unwrap());
        assert_eq!(storage.size("documents/a.txt").await.unwrap(), 11);
    }

    #[tokio::test]
    async fn test_size_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let err = storage.size("documents/missing.pdf").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_exists_reports_io_errors() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage
            .put("documents/a.txt", b"x".to_vec(), "text/plain")
            .await
            .unwrap();

        // A file used as a directory is an I/O error, not an absent object.
        let result = storage.exists("documents/a.txt/inner").await;
        assert!(matches!(result, Err(StorageError::IoError(_))));
    }

    #[tokio::test]
    async fn test_fetch_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let err = storage.fetch("documents/missing.pdf").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.fetch("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.put("/etc/passwd", vec![1], "text/plain").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_storage_delete_nonexistent() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        assert!(storage.delete("documents/nonexistent.txt").await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_removes_object() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage
            .put("documents/b.md", b"# title".to_vec(), "text/markdown")
            .await
            .unwrap();
        storage.delete("documents/b.md").await.unwrap();
        assert!(!storage.exists("documents/b.md").await.unwrap());
    }

    #[tokio::test]
    async fn test_write_credential_points_at_upload_endpoint() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let before = chrono::Utc::now();
        let credential = storage
            .issue_write_credential("documents/c.pdf", "application/pdf", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            credential.url,
            "http://localhost:3000/api/v1/blobs/documents/c.pdf"
        );
        assert_eq!(credential.method, "PUT");
        assert!(credential.expires_at > before);
        // Issuing a credential does not create the object.
        assert!(!storage.exists("documents/c.pdf").await.unwrap());
    }
}
