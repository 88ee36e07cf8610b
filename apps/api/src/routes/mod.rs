pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::analysis::handlers;
use crate::errors::AppError;
use crate::state::AppState;

/// Request bodies (JSON or multipart) above this size are rejected.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Bare OPTIONS requests; real CORS pre-flights are answered by `CorsLayer`.
async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

pub fn build_router(state: AppState) -> Router {
    let analyze = post(handlers::handle_analyze)
        .options(preflight)
        .fallback(method_not_allowed);
    let analyze_pdf = post(handlers::handle_analyze_pdf)
        .options(preflight)
        .fallback(method_not_allowed);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/analyze", analyze.clone())
        // Path used by serverless deployments of the same endpoint
        .route("/api/analyze", analyze)
        .route("/analyze/pdf", analyze_pdf)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// The router with tracing and CORS applied. Every origin is allowed.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
