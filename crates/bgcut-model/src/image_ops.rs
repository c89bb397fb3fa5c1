//! Image decoding, tensor conversion, and mask compositing.
//!
//! The network sees a fixed 320x320 normalized input regardless of source
//! dimensions; the predicted mask is scaled back up and applied as the
//! alpha channel of the untouched source pixels.

use std::io::Cursor;

use candle_core::{Device, Tensor};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, RgbaImage};

use crate::error::{ModelError, Result};

/// Side length the network input is resized to.
pub const INPUT_SIZE: usize = 320;

/// ImageNet channel statistics used by the published checkpoints.
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Decodes encoded image bytes, sniffing the format from the content.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| ModelError::invalid_image(e.to_string()))
}

/// Converts an image to the normalized `(1, 3, 320, 320)` NCHW input tensor.
pub fn to_input_tensor(img: &DynamicImage, device: &Device) -> Result<Tensor> {
    let resized = img
        .resize_exact(INPUT_SIZE as u32, INPUT_SIZE as u32, FilterType::Triangle)
        .to_rgb8();

    let plane = INPUT_SIZE * INPUT_SIZE;
    let mut data = vec![0f32; 3 * plane];
    for (i, px) in resized.pixels().enumerate() {
        for c in 0..3 {
            data[c * plane + i] = (px.0[c] as f32 / 255.0 - MEAN[c]) / STD[c];
        }
    }

    Ok(Tensor::from_vec(data, (1, 3, INPUT_SIZE, INPUT_SIZE), device)?)
}

/// Min-max normalizes a `(1, 1, h, w)` saliency map into an 8-bit gray image.
pub fn mask_to_gray(mask: &Tensor) -> Result<GrayImage> {
    let (_, _, h, w) = mask.dims4()?;
    let values = mask.flatten_all()?.to_vec1::<f32>()?;

    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    // Constant maps (max == min) normalize to zero rather than dividing by it.
    let range = (max - min).max(f32::EPSILON);

    let pixels: Vec<u8> = values
        .iter()
        .map(|v| (((v - min) / range) * 255.0).round() as u8)
        .collect();

    GrayImage::from_raw(w as u32, h as u32, pixels)
        .ok_or_else(|| ModelError::internal("mask buffer does not match its dimensions"))
}

/// Scales the mask to the source dimensions and applies it as the alpha
/// channel. RGB values pass through unchanged.
pub fn apply_alpha(img: &DynamicImage, mask: &GrayImage) -> RgbaImage {
    let resized = if mask.dimensions() == (img.width(), img.height()) {
        mask.clone()
    } else {
        image::imageops::resize(mask, img.width(), img.height(), FilterType::Lanczos3)
    };
    let mut out = img.to_rgba8();
    for (px, m) in out.pixels_mut().zip(resized.pixels()) {
        px.0[3] = m.0[0];
    }
    out
}

/// Encodes an RGBA image as PNG.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}
