//! Binary entrypoint for the bgcut HTTP server.
//!
//! Reads configuration from environment variables:
//! - `BGCUT_PORT`: listen port (default "8000")
//! - `BGCUT_MODEL`: checkpoint variant, "u2net" or "u2netp" (default "u2net")
//! - `BGCUT_MODEL_PATH`: local safetensors weight file (default: Hub fetch)
//! - `BGCUT_MODEL_REPO`: Hugging Face repo to fetch weights from
//! - `BGCUT_DEVICE`: "auto", "cpu", "cuda" or "metal" (default "auto")
//! - `BGCUT_MAX_UPLOAD_BYTES`: upload size limit (default 2 MiB)

use bgcut_server::config::ServerConfig;
use bgcut_server::router::build_router;
use bgcut_server::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env().expect("invalid server configuration");

    let state = AppState::from_config(&config).expect("failed to load segmentation engine");

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(model = %config.variant, "bgcut server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
