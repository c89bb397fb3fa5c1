//! Health-check handler.

use axum::Json;

use crate::schema::health::HealthResponse;

/// Liveness probe.
///
/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
