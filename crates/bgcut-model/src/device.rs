//! Compute device selection.

use candle_core::Device;

use crate::error::{ModelError, Result};

/// Requested compute device, parsed from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceKind {
    /// CUDA if available, otherwise CPU.
    #[default]
    Auto,
    /// CPU only.
    Cpu,
    /// CUDA device 0; fails if unavailable.
    Cuda,
    /// Metal device 0; fails if unavailable.
    Metal,
}

impl std::str::FromStr for DeviceKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" => Ok(Self::Cuda),
            "metal" => Ok(Self::Metal),
            other => Err(ModelError::device(format!("unknown device kind: {other}"))),
        }
    }
}

/// Resolves a [`DeviceKind`] to a concrete candle [`Device`].
///
/// `Auto` falls back to CPU when no accelerator is present; explicit
/// `Cuda`/`Metal` requests fail instead of silently degrading.
pub fn select_device(kind: DeviceKind) -> Result<Device> {
    match kind {
        DeviceKind::Auto => {
            let device = Device::cuda_if_available(0)
                .map_err(|e| ModelError::device(e.to_string()))?;
            if device.is_cuda() {
                tracing::info!("using CUDA device 0");
            } else {
                tracing::info!("using CPU");
            }
            Ok(device)
        }
        DeviceKind::Cpu => Ok(Device::Cpu),
        DeviceKind::Cuda => {
            Device::new_cuda(0).map_err(|e| ModelError::device(e.to_string()))
        }
        DeviceKind::Metal => {
            Device::new_metal(0).map_err(|e| ModelError::device(e.to_string()))
        }
    }
}
