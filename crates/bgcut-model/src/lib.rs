//! Salient-object segmentation engine for background removal.
//!
//! Wraps a pre-trained U²-Net checkpoint behind the [`BackgroundRemover`]
//! trait: encoded image bytes in, PNG bytes with a transparent background
//! out. The HTTP layer lives in `bgcut-server`; this crate owns weight
//! loading, device selection, the network itself, and image pre/post
//! processing.

pub mod device;
pub mod error;
pub mod image_ops;
pub mod remover;
pub mod u2net;
pub mod weights;

pub use device::DeviceKind;
pub use error::{ModelError, Result};
pub use remover::{BackgroundRemover, RemoverOptions, U2NetRemover};
pub use u2net::{U2Net, U2NetVariant};
