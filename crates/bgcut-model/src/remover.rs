//! The background-removal seam: a trait for callers, one engine behind it.

use std::path::PathBuf;

use candle_core::{DType, Device};
use candle_nn::VarBuilder;

use crate::device::{self, DeviceKind};
use crate::error::{ModelError, Result};
use crate::image_ops;
use crate::u2net::{U2Net, U2NetVariant};
use crate::weights;

/// Removes backgrounds from encoded images.
///
/// Implementations are stateless per call and shareable across threads, so
/// a server can hold one behind an `Arc` and invoke it concurrently.
pub trait BackgroundRemover: Send + Sync {
    /// Removes the background from an encoded image, returning PNG bytes
    /// with the subject preserved and everything else transparent.
    fn remove(&self, image: &[u8]) -> Result<Vec<u8>>;
}

/// Options controlling engine construction.
#[derive(Debug, Clone, Default)]
pub struct RemoverOptions {
    /// Checkpoint variant to load.
    pub variant: U2NetVariant,
    /// Compute device request.
    pub device: DeviceKind,
    /// Local safetensors file; set to skip the Hub entirely.
    pub weights_path: Option<PathBuf>,
    /// Hub repo to fetch weights from when no local path is given.
    pub weights_repo: Option<String>,
}

/// U²-Net-backed implementation of [`BackgroundRemover`].
pub struct U2NetRemover {
    net: U2Net,
    device: Device,
}

impl U2NetRemover {
    /// Resolves the device and weights, then builds the network.
    pub fn load(options: &RemoverOptions) -> Result<Self> {
        let device = device::select_device(options.device)?;
        let weights = weights::resolve(
            options.variant,
            options.weights_path.as_deref(),
            options.weights_repo.as_deref(),
        )?;

        tracing::info!(
            variant = %options.variant,
            path = %weights.display(),
            "loading segmentation checkpoint"
        );
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights], DType::F32, &device)
                .map_err(|e| ModelError::weight_load(e.to_string()))?
        };
        let net = U2Net::load(options.variant, vb)?;

        Ok(Self { net, device })
    }
}

impl BackgroundRemover for U2NetRemover {
    fn remove(&self, image: &[u8]) -> Result<Vec<u8>> {
        let img = image_ops::decode(image)?;
        let input = image_ops::to_input_tensor(&img, &self.device)?;
        let mask = self.net.forward(&input)?;
        let gray = image_ops::mask_to_gray(&mask)?;
        let out = image_ops::apply_alpha(&img, &gray);
        image_ops::encode_png(&out)
    }
}
