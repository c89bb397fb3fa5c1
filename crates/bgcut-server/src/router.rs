//! Router assembly for the bgcut HTTP API.
//!
//! [`build_router`] wires the handlers to their routes with CORS and
//! tracing middleware layers.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Slack on top of the upload limit for multipart framing, so the
/// transport-level cap never fires before the handler's exact check.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Builds the complete axum router.
///
/// CORS is permissive (the upload form may be served from any origin).
/// TraceLayer provides request-level logging via tracing.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes + MULTIPART_OVERHEAD;
    Router::new()
        .route("/remove", post(handlers::remove::remove_background))
        .route("/health", get(handlers::health::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
