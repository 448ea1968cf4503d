use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use docket_core::models::{SearchQuery, SearchResponse};

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::DocumentState;

/// Similarity search over analyzed documents
#[utoipa::path(
    get,
    path = "/api/v1/search",
    tag = "search",
    params(
        SearchQuery
    ),
    responses(
        (status = 200, description = "Ranked matches", body = SearchResponse),
        (status = 400, description = "Empty query", body = ErrorResponse),
        (status = 502, description = "Index or embedding provider failed", body = ErrorResponse)
    )
)]
pub async fn search_documents(
    State(documents): State<DocumentState>,
    Query(params): Query<SearchQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let results = documents.service.search(&params.q, params.top_k).await?;

    Ok(Json(SearchResponse {
        query: params.q,
        results,
    }))
}
