use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for similarity search
#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Free-text query
    pub q: String,
    /// Number of matches to return (1..=50, default 5)
    pub top_k: Option<usize>,
}

/// A ranked match from the content index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchResult {
    pub document_id: i64,
    pub index_ref: String,
    pub filename: String,
    /// Leading excerpt of the indexed text
    pub snippet: String,
    /// Cosine similarity, higher is closer
    pub score: f32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
}
