//! Document lifecycle endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use docket_core::constants::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use docket_core::models::{
    BeginUploadRequest, BeginUploadResponse, DocumentListResponse, DocumentResponse,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::DocumentState;

/// Request an upload slot: creates a `PRE_SIGNED` record and returns a write credential
#[utoipa::path(
    post,
    path = "/api/v1/documents/upload",
    tag = "documents",
    request_body = BeginUploadRequest,
    responses(
        (status = 201, description = "Upload slot issued", body = BeginUploadResponse),
        (status = 400, description = "Invalid filename", body = ErrorResponse),
        (status = 502, description = "Blob storage unavailable", body = ErrorResponse)
    )
)]
pub async fn begin_upload(
    State(documents): State<DocumentState>,
    ValidatedJson(request): ValidatedJson<BeginUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;

    let response = documents
        .service
        .begin_upload(&request.filename, request.content_type.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Confirm the client finished writing the bytes
#[utoipa::path(
    post,
    path = "/api/v1/documents/{id}/confirm",
    tag = "documents",
    params(
        ("id" = i64, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document is UPLOADED", body = DocumentResponse),
        (status = 404, description = "Document not found", body = ErrorResponse),
        (status = 409, description = "Document already PARSED", body = ErrorResponse)
    )
)]
pub async fn confirm_upload(
    State(documents): State<DocumentState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = documents.service.confirm_upload(id).await?;
    Ok(Json(DocumentResponse::from(record)))
}

/// Extract, embed and index an uploaded document
#[utoipa::path(
    post,
    path = "/api/v1/documents/{id}/analyze",
    tag = "documents",
    params(
        ("id" = i64, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document is PARSED", body = DocumentResponse),
        (status = 404, description = "Document not found", body = ErrorResponse),
        (status = 409, description = "Upload not confirmed", body = ErrorResponse),
        (status = 422, description = "Bytes missing or without usable text", body = ErrorResponse),
        (status = 502, description = "Blob, index or embedding provider failed", body = ErrorResponse)
    )
)]
pub async fn analyze_document(
    State(documents): State<DocumentState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = documents.service.analyze(id).await?;
    Ok(Json(DocumentResponse::from(record)))
}

#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}",
    tag = "documents",
    params(
        ("id" = i64, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document found", body = DocumentResponse),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
pub async fn get_document(
    State(documents): State<DocumentState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = documents.service.get(id).await?;
    Ok(Json(DocumentResponse::from(record)))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PaginationQuery {
    /// Records to skip
    #[serde(default)]
    pub offset: i64,
    /// Page size (1..=100, default 100)
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIST_LIMIT
}

#[utoipa::path(
    get,
    path = "/api/v1/documents",
    tag = "documents",
    params(
        PaginationQuery
    ),
    responses(
        (status = 200, description = "Page of documents", body = DocumentListResponse)
    )
)]
pub async fn list_documents(
    State(documents): State<DocumentState>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let limit = pagination.limit.clamp(1, MAX_LIST_LIMIT);
    let offset = pagination.offset.max(0);

    let (records, total_count) = documents.service.list(offset, limit).await?;

    Ok(Json(DocumentListResponse {
        documents: records.into_iter().map(DocumentResponse::from).collect(),
        total_count,
        offset,
        limit,
    }))
}

/// Remove a document from the index, blob storage and the record store
#[utoipa::path(
    delete,
    path = "/api/v1/documents/{id}",
    tag = "documents",
    params(
        ("id" = i64, Path, description = "Document ID")
    ),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 404, description = "Document not found", body = ErrorResponse),
        (status = 500, description = "Some stores could not be cleaned; record kept", body = ErrorResponse)
    )
)]
pub async fn delete_document(
    State(documents): State<DocumentState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    documents.service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
