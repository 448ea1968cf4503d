//! Shared key generation for storage backends.
//!
//! Key format: `documents/{uuid}.{ext}`, where `ext` is the lowercase filename extension
//! (or `bin` when the filename has none).

use docket_core::constants::{FALLBACK_EXTENSION, STORAGE_KEY_PREFIX};
use docket_core::validation::document_extension;
use uuid::Uuid;

use crate::traits::{StorageError, StorageResult};

/// Generate a fresh storage key for an uploaded document.
///
/// Keys are UUID v4 based so they are never reused, even after the record is deleted.
pub fn generate_storage_key(filename: &str) -> String {
    let ext = document_extension(filename).unwrap_or_else(|| FALLBACK_EXTENSION.to_string());
    format!("{}/{}.{}", STORAGE_KEY_PREFIX, Uuid::new_v4(), ext)
}

/// Reject keys that could escape the storage root or that this service never issues.
pub fn validate_storage_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty() || storage_key.contains("..") || storage_key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }

    let prefix = format!("{}/", STORAGE_KEY_PREFIX);
    let name = storage_key
        .strip_prefix(&prefix)
        .ok_or_else(|| StorageError::InvalidKey(format!("Storage key must start with {}", prefix)))?;

    if name.is_empty() || name.contains('/') || name.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Storage key must name a single object".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_keys_are_unique_and_keep_extension() {
        let a = generate_storage_key("report.PDF");
        let b = generate_storage_key("report.PDF");
        assert_ne!(a, b);
        assert!(a.starts_with("documents/"));
        assert!(a.ends_with(".pdf"));
        assert!(validate_storage_key(&a).is_ok());
    }

    #[test]
    fn test_missing_extension_uses_fallback() {
        assert!(generate_storage_key("README").ends_with(".bin"));
    }

    #[test]
    fn test_validate_rejects_foreign_and_traversal_keys() {
        assert!(validate_storage_key("documents/../secret").is_err());
        assert!(validate_storage_key("/documents/a.pdf").is_err());
        assert!(validate_storage_key("media/a.pdf").is_err());
        assert!(validate_storage_key("documents/nested/a.pdf").is_err());
        assert!(validate_storage_key("documents/").is_err());
    }
}
