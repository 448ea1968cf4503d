//! Error types module
//!
//! This module provides the core error types used throughout Docket.
//! All lifecycle failures are unified under the `AppError` enum; adapter errors are
//! converted into it at the orchestrator boundary, tagged with the `Provider` that failed.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

use std::fmt;
use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for caller mistakes against current state
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// This trait allows errors to self-describe their HTTP response characteristics
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "PROVIDER_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Backing store or external service a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Blob storage (S3 or local filesystem)
    Blob,
    /// Vector/search content index
    Index,
    /// Relational record store
    Records,
    /// Embedding provider used by the content pipeline
    Embedding,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Blob => write!(f, "blob"),
            Provider::Index => write!(f, "index"),
            Provider::Records => write!(f, "records"),
            Provider::Embedding => write!(f, "embedding"),
        }
    }
}

fn join_providers(providers: &[Provider]) -> String {
    providers
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{provider} provider error: {message}")]
    Provider { provider: Provider, message: String },

    #[error("Source missing: {0}")]
    SourceMissing(String),

    #[error("Unprocessable content: {0}")]
    Unprocessable(String),

    #[error("Partial delete of document {id}: uncleaned stores [{}]", join_providers(.uncleaned))]
    PartialDeleteFailure { id: i64, uncleaned: Vec<Provider> },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Shorthand for a `Provider` error.
    pub fn provider(provider: Provider, message: impl Into<String>) -> Self {
        AppError::Provider {
            provider,
            message: message.into(),
        }
    }
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
/// client_message stays per-variant for dynamic content.
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Database(_) => (
            503,
            "DATABASE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the document ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::Conflict(_) => (
            409,
            "CONFLICT",
            true,
            Some("Re-fetch the document and retry against its current status"),
            false,
            LogLevel::Warn,
        ),
        AppError::Provider {
            provider: Provider::Records,
            ..
        } => (
            503,
            "PROVIDER_ERROR",
            true,
            Some("Retry with backoff"),
            true,
            LogLevel::Error,
        ),
        AppError::Provider { .. } => (
            502,
            "PROVIDER_ERROR",
            true,
            Some("Retry with backoff"),
            true,
            LogLevel::Error,
        ),
        AppError::SourceMissing(_) => (
            422,
            "SOURCE_MISSING",
            false,
            Some("Upload the file again under a new document"),
            false,
            LogLevel::Warn,
        ),
        AppError::Unprocessable(_) => (
            422,
            "UNPROCESSABLE_CONTENT",
            false,
            Some("Upload a document containing extractable text"),
            false,
            LogLevel::Warn,
        ),
        AppError::PartialDeleteFailure { .. } => (
            500,
            "PARTIAL_DELETE_FAILURE",
            true,
            Some("Retry the delete; the document record was kept"),
            false,
            LogLevel::Error,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::NotFound(_) => "NotFound",
            AppError::Conflict(_) => "Conflict",
            AppError::Provider { .. } => "Provider",
            AppError::SourceMissing(_) => "SourceMissing",
            AppError::Unprocessable(_) => "Unprocessable",
            AppError::PartialDeleteFailure { .. } => "PartialDeleteFailure",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Conflict(ref msg) => msg.clone(),
            AppError::Provider { provider, .. } => {
                format!("Failed to reach the {} provider", provider)
            }
            AppError::SourceMissing(ref msg) => msg.clone(),
            AppError::Unprocessable(ref msg) => msg.clone(),
            AppError::PartialDeleteFailure { id, uncleaned } => format!(
                "Document {} was not fully deleted; uncleaned stores: {}",
                id,
                join_providers(uncleaned)
            ),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_database() {
        #[cfg(feature = "sqlx")]
        let err = AppError::from(sqlx::Error::PoolClosed);
        #[cfg(not(feature = "sqlx"))]
        let err = AppError::Database("pool closed".to_string());
        assert_eq!(err.http_status_code(), 503);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert!(err.is_recoverable());
        assert_eq!(err.client_message(), "Failed to access database");
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_metadata_not_found() {
        let err = AppError::NotFound("Document 7 not found".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "Document 7 not found");
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_conflict_is_retryable() {
        let err = AppError::Conflict("status is PARSED".to_string());
        assert_eq!(err.http_status_code(), 409);
        assert_eq!(err.error_code(), "CONFLICT");
        assert!(err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_error_metadata_provider_status_depends_on_provider() {
        let blob = AppError::provider(Provider::Blob, "connection reset");
        assert_eq!(blob.http_status_code(), 502);
        assert_eq!(blob.error_code(), "PROVIDER_ERROR");
        assert!(blob.is_sensitive());
        assert_eq!(blob.client_message(), "Failed to reach the blob provider");

        let records = AppError::provider(Provider::Records, "pool timed out");
        assert_eq!(records.http_status_code(), 503);
        assert_eq!(records.error_code(), "PROVIDER_ERROR");
    }

    #[test]
    fn test_error_metadata_unprocessable_and_source_missing() {
        let missing = AppError::SourceMissing("no object".to_string());
        assert_eq!(missing.http_status_code(), 422);
        assert_eq!(missing.error_code(), "SOURCE_MISSING");
        assert!(!missing.is_recoverable());

        let unprocessable = AppError::Unprocessable("empty text".to_string());
        assert_eq!(unprocessable.http_status_code(), 422);
        assert_eq!(unprocessable.error_code(), "UNPROCESSABLE_CONTENT");
    }

    #[test]
    fn test_partial_delete_failure_names_uncleaned_stores() {
        let err = AppError::PartialDeleteFailure {
            id: 3,
            uncleaned: vec![Provider::Index, Provider::Blob],
        };
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "PARTIAL_DELETE_FAILURE");
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("index, blob"));
        assert!(err.client_message().contains("Document 3"));
        assert_eq!(err.error_type(), "PartialDeleteFailure");
    }

    #[test]
    fn test_detailed_message_includes_source_chain() {
        let err = AppError::from(anyhow::anyhow!("root cause").context("outer"));
        let details = err.detailed_message();
        assert!(details.starts_with("Internal error with source"));
        assert!(details.contains("Caused by: outer"));
    }
}
