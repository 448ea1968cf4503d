#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{BlobStorage, StorageBackend, StorageError, StorageResult};
use docket_core::Config;
use std::sync::Arc;

/// Create a blob storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn BlobStorage>> {
    match config.storage_backend() {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket()
                .map(String::from)
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config.s3_region().map(String::from).ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;
            let endpoint = config.s3_endpoint().map(String::from);

            let storage = S3Storage::new(bucket, region, endpoint).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config
                .local_storage_path()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
                })?;
            let base_url = config
                .local_storage_base_url()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
                })?;

            let storage = LocalStorage::new(base_path, base_url).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),

        #[cfg(any(test, feature = "test-helpers"))]
        StorageBackend::Memory => Ok(Arc::new(crate::MemoryStorage::new())),

        #[cfg(not(any(test, feature = "test-helpers")))]
        StorageBackend::Memory => Err(StorageError::ConfigError(
            "Memory storage backend not available (test-helpers feature not enabled)".to_string(),
        )),
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use docket_core::config::DocketConfig;

    #[tokio::test]
    async fn test_create_local_storage_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut inner = DocketConfig::default();
        inner.local_storage_path = Some(dir.path().display().to_string());
        let config = Config(Box::new(inner));

        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Local);
    }

    #[tokio::test]
    async fn test_missing_bucket_is_config_error() {
        let mut inner = DocketConfig::default();
        inner.storage_backend = Some(StorageBackend::S3);
        inner.s3_region = Some("us-east-1".to_string());
        let config = Config(Box::new(inner));

        let result = create_storage(&config).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }
}
