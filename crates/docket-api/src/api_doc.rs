//! OpenAPI documentation, served at `constants::OPENAPI_PATH`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use docket_core::models;

/// Returns the OpenAPI spec for the versioned API.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Docket API",
        version = "0.1.0",
        description = "Document lifecycle API (v1): presigned uploads, text extraction and embedding, similarity search, and coordinated deletion across blob storage, the record store and the content index. All endpoints are versioned under /api/v1/."
    ),
    paths(
        handlers::documents::begin_upload,
        handlers::documents::confirm_upload,
        handlers::documents::analyze_document,
        handlers::documents::get_document,
        handlers::documents::list_documents,
        handlers::documents::delete_document,
        handlers::search::search_documents,
        handlers::blobs::put_blob,
    ),
    components(
        schemas(
            models::DocumentStatus,
            models::DocumentResponse,
            models::DocumentListResponse,
            models::BeginUploadRequest,
            models::BeginUploadResponse,
            models::SearchResult,
            models::SearchResponse,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "documents", description = "Document upload, analysis and deletion"),
        (name = "search", description = "Similarity search over analyzed documents"),
        (name = "blobs", description = "Direct upload target for the local storage backend")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_document_routes() {
        let spec = get_openapi_spec();
        assert!(spec.paths.paths.contains_key("/api/v1/documents/upload"));
        assert!(spec.paths.paths.contains_key("/api/v1/documents/{id}/analyze"));
        assert!(spec.paths.paths.contains_key("/api/v1/search"));
    }
}
