//! Docket Core Library
//!
//! This crate provides the document record model, lifecycle status machine, error
//! types, configuration, and validation shared across all Docket components.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel, Provider};
pub use models::{DocumentRecord, DocumentStatus};
pub use storage_types::StorageBackend;
