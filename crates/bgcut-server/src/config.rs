//! Environment-driven server configuration.

use std::path::PathBuf;

use bgcut_model::{DeviceKind, RemoverOptions, U2NetVariant};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default upload size limit: 2 MiB, the contract of the public endpoint.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

/// Configuration error for malformed environment values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set to a value that does not parse.
    #[error("invalid value for {var}: {value:?}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// The offending value.
        value: String,
    },
}

/// Server configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen port.
    pub port: u16,
    /// Hard limit on accepted upload payloads, in bytes.
    pub max_upload_bytes: usize,
    /// Segmentation checkpoint variant.
    pub variant: U2NetVariant,
    /// Compute device request.
    pub device: DeviceKind,
    /// Local weight file, if any.
    pub weights_path: Option<PathBuf>,
    /// Hub repo override for weight downloads.
    pub weights_repo: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            variant: U2NetVariant::default(),
            device: DeviceKind::default(),
            weights_path: None,
            weights_repo: None,
        }
    }
}

impl ServerConfig {
    /// Reads configuration from `BGCUT_*` environment variables, keeping
    /// defaults for anything unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = env_var("BGCUT_PORT") {
            config.port = v.parse().map_err(|_| ConfigError::Invalid {
                var: "BGCUT_PORT",
                value: v.clone(),
            })?;
        }
        if let Some(v) = env_var("BGCUT_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = v.parse().map_err(|_| ConfigError::Invalid {
                var: "BGCUT_MAX_UPLOAD_BYTES",
                value: v.clone(),
            })?;
        }
        if let Some(v) = env_var("BGCUT_MODEL") {
            config.variant = v.parse().map_err(|_| ConfigError::Invalid {
                var: "BGCUT_MODEL",
                value: v.clone(),
            })?;
        }
        if let Some(v) = env_var("BGCUT_DEVICE") {
            config.device = v.parse().map_err(|_| ConfigError::Invalid {
                var: "BGCUT_DEVICE",
                value: v.clone(),
            })?;
        }
        config.weights_path = env_var("BGCUT_MODEL_PATH").map(PathBuf::from);
        config.weights_repo = env_var("BGCUT_MODEL_REPO");

        Ok(config)
    }

    /// Engine construction options for this configuration.
    pub fn remover_options(&self) -> RemoverOptions {
        RemoverOptions {
            variant: self.variant,
            device: self.device,
            weights_path: self.weights_path.clone(),
            weights_repo: self.weights_repo.clone(),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
