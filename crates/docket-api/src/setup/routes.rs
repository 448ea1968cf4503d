//! Route configuration and setup

use crate::constants::{API_PREFIX, OPENAPI_PATH};
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post, put},
    Json, Router,
};
use docket_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes with the middleware stack
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config);

    // Server-level concurrency limit to protect against resource exhaustion under extreme load
    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10_000)
        .max(1);
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        "HTTP concurrency limit layer enabled"
    );

    let max_body = config.max_document_size_bytes();
    let app = build_router(state)
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

/// Application routes without server-level middleware.
pub fn build_router(state: Arc<AppState>) -> Router<()> {
    Router::new()
        .merge(public_routes())
        .merge(document_routes())
        .merge(search_routes())
        .merge(blob_routes())
        .with_state(state)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins()
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    }
}

/// Health probes and the OpenAPI document
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::liveness_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route(
            OPENAPI_PATH,
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
}

fn document_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/documents", API_PREFIX),
            get(handlers::documents::list_documents),
        )
        .route(
            &format!("{}/documents/upload", API_PREFIX),
            post(handlers::documents::begin_upload),
        )
        .route(
            &format!("{}/documents/{{id}}", API_PREFIX),
            get(handlers::documents::get_document).delete(handlers::documents::delete_document),
        )
        .route(
            &format!("{}/documents/{{id}}/confirm", API_PREFIX),
            post(handlers::documents::confirm_upload),
        )
        .route(
            &format!("{}/documents/{{id}}/analyze", API_PREFIX),
            post(handlers::documents::analyze_document),
        )
}

fn search_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        &format!("{}/search", API_PREFIX),
        get(handlers::search::search_documents),
    )
}

fn blob_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        &format!("{}/blobs/{{*key}}", API_PREFIX),
        put(handlers::blobs::put_blob),
    )
}
