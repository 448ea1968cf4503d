//! Direct upload target for the local storage backend.
//!
//! Local write credentials point here; S3 credentials point at the bucket instead. Bytes are
//! only accepted for a key owned by a `PRE_SIGNED` record.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
};
use docket_core::constants::DEFAULT_CONTENT_TYPE;
use docket_core::AppError;
use docket_storage::validate_storage_key;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::BlobState;

#[utoipa::path(
    put,
    path = "/api/v1/blobs/{key}",
    tag = "blobs",
    params(
        ("key" = String, Path, description = "Storage key issued at begin-upload")
    ),
    request_body(content = String, content_type = "application/octet-stream"),
    responses(
        (status = 204, description = "Bytes stored"),
        (status = 400, description = "Invalid key or body", body = ErrorResponse),
        (status = 404, description = "No document owns the key, or direct upload is not available on this backend", body = ErrorResponse),
        (status = 409, description = "Upload already confirmed", body = ErrorResponse)
    )
)]
pub async fn put_blob(
    State(blobs): State<BlobState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    if !blobs.direct_upload_enabled {
        return Err(AppError::NotFound(
            "Direct upload is only available on the local storage backend".to_string(),
        )
        .into());
    }

    validate_storage_key(&key)?;

    if body.is_empty() {
        return Err(AppError::InvalidInput("Upload body is empty".to_string()).into());
    }
    if body.len() > blobs.max_document_size {
        return Err(AppError::InvalidInput(format!(
            "Upload of {} bytes exceeds the {} byte limit",
            body.len(),
            blobs.max_document_size
        ))
        .into());
    }

    let record = blobs.service.pending_upload(&key).await?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE);

    blobs.storage.put(&key, body.to_vec(), content_type).await?;

    tracing::info!(
        document_id = record.id,
        storage_key = %key,
        size = body.len(),
        "Blob stored"
    );
    Ok(StatusCode::NO_CONTENT)
}
