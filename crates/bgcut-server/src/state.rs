//! Application state shared across handlers.
//!
//! The segmentation engine is stateless per call and `Send + Sync`, so it
//! sits behind a plain `Arc` with no interior locking; handlers clone the
//! `Arc` and run inference on the blocking thread pool.

use std::sync::Arc;

use bgcut_model::{BackgroundRemover, ModelError, U2NetRemover};

use crate::config::ServerConfig;

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    /// The background-removal engine.
    pub remover: Arc<dyn BackgroundRemover>,
    /// Hard limit on accepted upload payloads, in bytes.
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Loads the segmentation engine described by `config`.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ModelError> {
        let remover = U2NetRemover::load(&config.remover_options())?;
        Ok(Self {
            remover: Arc::new(remover),
            max_upload_bytes: config.max_upload_bytes,
        })
    }

    /// Builds state around an existing remover (used by tests).
    pub fn with_remover(remover: Arc<dyn BackgroundRemover>, max_upload_bytes: usize) -> Self {
        Self {
            remover,
            max_upload_bytes,
        }
    }
}
