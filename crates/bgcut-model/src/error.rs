//! Error types for the segmentation engine.

use thiserror::Error;

/// Result type alias using [`ModelError`].
pub type Result<T> = std::result::Result<T, ModelError>;

/// Unified error type for the segmentation engine.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Input bytes could not be decoded as an image.
    #[error("invalid image: {message}")]
    InvalidImage {
        /// Decoder error message.
        message: String,
    },

    /// Weight file missing, unreadable, or not downloadable.
    #[error("failed to load weights: {message}")]
    WeightLoad {
        /// Error message.
        message: String,
    },

    /// Requested compute device is unavailable.
    #[error("device unavailable: {message}")]
    Device {
        /// Error message.
        message: String,
    },

    /// Tensor backend error during the forward pass.
    #[error("inference error: {0}")]
    Inference(#[from] candle_core::Error),

    /// Result image could not be encoded.
    #[error("failed to encode result: {0}")]
    Encode(#[from] image::ImageError),

    /// Internal error (unexpected state).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl ModelError {
    /// Creates an invalid-image error with the given message.
    pub fn invalid_image(message: impl Into<String>) -> Self {
        Self::InvalidImage {
            message: message.into(),
        }
    }

    /// Creates a weight-loading error with the given message.
    pub fn weight_load(message: impl Into<String>) -> Self {
        Self::WeightLoad {
            message: message.into(),
        }
    }

    /// Creates a device error with the given message.
    pub fn device(message: impl Into<String>) -> Self {
        Self::Device {
            message: message.into(),
        }
    }

    /// Creates an internal error with the given message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
