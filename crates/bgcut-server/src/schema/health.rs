//! Health-check response schema.

use serde::Serialize;

/// Body returned by `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process is serving.
    pub status: &'static str,
}

impl HealthResponse {
    /// The healthy response.
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}
