//! Docket Storage Library
//!
//! Blob staging for document bytes. Clients write directly to blob storage using a
//! time-limited write credential; the service later fetches the bytes for analysis
//! and removes them on delete.
//!
//! # Storage key format
//!
//! Every backend uses the same layout: `documents/{uuid}.{ext}`. Keys are generated once
//! per record and never reused. Keys must not contain `..` or a leading `/`. Key generation
//! is centralized in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(any(test, feature = "test-helpers"))]
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use docket_core::models::WriteCredential;
pub use docket_core::StorageBackend;
pub use factory::create_storage;
pub use keys::{generate_storage_key, validate_storage_key};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(any(test, feature = "test-helpers"))]
pub use memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{BlobStorage, StorageError, StorageResult};
