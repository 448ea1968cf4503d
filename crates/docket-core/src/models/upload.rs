use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request an upload slot for a new document
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct BeginUploadRequest {
    /// Original filename
    #[validate(length(
        min = 1,
        max = 255,
        message = "Filename must be between 1 and 255 characters"
    ))]
    pub filename: String,
    /// Content type (MIME type) the client will upload with
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 255,
        message = "Content type must be between 1 and 255 characters"
    ))]
    pub content_type: Option<String>,
}

/// Upload slot: record id plus the time-limited write credential
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BeginUploadResponse {
    /// Document record id
    pub id: i64,
    /// Blob key the bytes must be written to
    pub storage_key: String,
    /// Presigned URL for direct upload
    pub upload_url: String,
    /// HTTP method to use against `upload_url`
    pub method: String,
    /// URL expiration time
    pub expires_at: DateTime<Utc>,
}

/// Time-limited credential permitting a client to write one blob directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteCredential {
    pub url: String,
    pub method: String,
    pub expires_at: DateTime<Utc>,
}

impl BeginUploadResponse {
    pub fn new(id: i64, storage_key: String, credential: WriteCredential) -> Self {
        Self {
            id,
            storage_key,
            upload_url: credential.url,
            method: credential.method,
            expires_at: credential.expires_at,
        }
    }
}
