//! Health check handlers.

use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::state::DocumentState;

/// Liveness probe - process is running.
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Readiness probe - the record store answers within the timeout.
pub async fn readiness_check(State(documents): State<DocumentState>) -> impl IntoResponse {
    const TIMEOUT: Duration = Duration::from_secs(5);

    match tokio::time::timeout(TIMEOUT, documents.service.check_records()).await {
        Ok(Ok(())) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ready", "records": "ready" })),
        ),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Record store readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "not_ready", "records": "unavailable" })),
            )
        }
        Err(_) => {
            tracing::error!("Record store readiness check timed out");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "not_ready", "records": "timeout" })),
            )
        }
    }
}
