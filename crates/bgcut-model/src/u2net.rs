//! U²-Net salient-object segmentation network.
//!
//! Candle implementation of the nested-U architecture: six RSU encoder
//! stages (the two deepest dilated instead of pooled), five RSU decoder
//! stages, and six side outputs fused by a 1x1 convolution. Weight tensor
//! names follow the published checkpoint layout (`stage1.rebnconvin.conv_s1`
//! etc.) so a converted safetensors file loads without renaming.

use candle_core::Tensor;
use candle_nn::{batch_norm, conv2d, BatchNorm, Conv2d, Conv2dConfig, Module, ModuleT, VarBuilder};

use crate::error::{ModelError, Result};

/// Which published checkpoint the network is shaped for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum U2NetVariant {
    /// The full u2net checkpoint (~176 MB of weights).
    #[default]
    Full,
    /// The u2netp checkpoint (~4.7 MB), same topology with narrow channels.
    Lite,
}

impl U2NetVariant {
    /// Weight file name within a checkpoint repo.
    pub fn weight_file(self) -> &'static str {
        match self {
            Self::Full => "u2net.safetensors",
            Self::Lite => "u2netp.safetensors",
        }
    }

    fn encoder_specs(self) -> [StageSpec; 6] {
        match self {
            Self::Full => [
                StageSpec::rsu(7, 3, 32, 64),
                StageSpec::rsu(6, 64, 32, 128),
                StageSpec::rsu(5, 128, 64, 256),
                StageSpec::rsu(4, 256, 128, 512),
                StageSpec::dilated(512, 256, 512),
                StageSpec::dilated(512, 256, 512),
            ],
            Self::Lite => [
                StageSpec::rsu(7, 3, 16, 64),
                StageSpec::rsu(6, 64, 16, 64),
                StageSpec::rsu(5, 64, 16, 64),
                StageSpec::rsu(4, 64, 16, 64),
                StageSpec::dilated(64, 16, 64),
                StageSpec::dilated(64, 16, 64),
            ],
        }
    }

    /// Decoder stages, outermost-last (stage5d down to stage1d).
    fn decoder_specs(self) -> [StageSpec; 5] {
        match self {
            Self::Full => [
                StageSpec::dilated(1024, 256, 512),
                StageSpec::rsu(4, 1024, 128, 256),
                StageSpec::rsu(5, 512, 64, 128),
                StageSpec::rsu(6, 256, 32, 64),
                StageSpec::rsu(7, 128, 16, 64),
            ],
            Self::Lite => [
                StageSpec::dilated(128, 16, 64),
                StageSpec::rsu(4, 128, 16, 64),
                StageSpec::rsu(5, 128, 16, 64),
                StageSpec::rsu(6, 128, 16, 64),
                StageSpec::rsu(7, 128, 16, 64),
            ],
        }
    }

    /// Input channels of side1..side6.
    fn side_channels(self) -> [usize; 6] {
        match self {
            Self::Full => [64, 64, 128, 256, 512, 512],
            Self::Lite => [64; 6],
        }
    }
}

impl std::str::FromStr for U2NetVariant {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "u2net" | "full" => Ok(Self::Full),
            "u2netp" | "lite" => Ok(Self::Lite),
            other => Err(ModelError::weight_load(format!(
                "unknown model variant: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for U2NetVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => f.write_str("u2net"),
            Self::Lite => f.write_str("u2netp"),
        }
    }
}

/// Shape of one RSU stage.
#[derive(Debug, Clone, Copy)]
struct StageSpec {
    height: usize,
    dilated: bool,
    in_ch: usize,
    mid_ch: usize,
    out_ch: usize,
}

impl StageSpec {
    const fn rsu(height: usize, in_ch: usize, mid_ch: usize, out_ch: usize) -> Self {
        Self {
            height,
            dilated: false,
            in_ch,
            mid_ch,
            out_ch,
        }
    }

    const fn dilated(in_ch: usize, mid_ch: usize, out_ch: usize) -> Self {
        Self {
            height: 4,
            dilated: true,
            in_ch,
            mid_ch,
            out_ch,
        }
    }
}

/// conv3x3 + batch norm + relu, the basic unit of every RSU block.
struct RebnConv {
    conv: Conv2d,
    bn: BatchNorm,
}

impl RebnConv {
    fn load(in_ch: usize, out_ch: usize, dilation: usize, vb: VarBuilder) -> Result<Self> {
        let cfg = Conv2dConfig {
            padding: dilation,
            dilation,
            ..Default::default()
        };
        let conv = conv2d(in_ch, out_ch, 3, cfg, vb.pp("conv_s1"))?;
        let bn = batch_norm(out_ch, 1e-5, vb.pp("bn_s1"))?;
        Ok(Self { conv, bn })
    }

    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let x = self.conv.forward(x)?;
        let x = self.bn.forward_t(&x, false)?;
        Ok(x.relu()?)
    }
}

/// Resizes `x` to the spatial dimensions of `target`.
fn upsample_like(x: &Tensor, target: &Tensor) -> Result<Tensor> {
    let (_, _, h, w) = target.dims4()?;
    Ok(x.upsample_nearest2d(h, w)?)
}

/// A residual U-block: a small U-Net whose output is added to its own
/// input projection. `height` counts the encoder convolutions (RSU-7 has
/// height 7); pooling halves the resolution between all but the two
/// deepest of them.
struct Rsu {
    conv_in: RebnConv,
    enc: Vec<RebnConv>,
    dec: Vec<RebnConv>,
}

impl Rsu {
    fn load(height: usize, in_ch: usize, mid_ch: usize, out_ch: usize, vb: VarBuilder) -> Result<Self> {
        let conv_in = RebnConv::load(in_ch, out_ch, 1, vb.pp("rebnconvin"))?;
        let mut enc = Vec::with_capacity(height);
        for i in 1..=height {
            let ic = if i == 1 { out_ch } else { mid_ch };
            // The deepest encoder conv is dilated instead of pooled.
            let dilation = if i == height { 2 } else { 1 };
            enc.push(RebnConv::load(ic, mid_ch, dilation, vb.pp(format!("rebnconv{i}")))?);
        }
        let mut dec = Vec::with_capacity(height - 1);
        for i in (1..height).rev() {
            let oc = if i == 1 { out_ch } else { mid_ch };
            dec.push(RebnConv::load(mid_ch * 2, oc, 1, vb.pp(format!("rebnconv{i}d")))?);
        }
        Ok(Self { conv_in, enc, dec })
    }

    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let height = self.enc.len();
        let hx_in = self.conv_in.forward(x)?;

        let mut feats = Vec::with_capacity(height);
        let mut hx = hx_in.clone();
        for (i, conv) in self.enc.iter().enumerate() {
            hx = conv.forward(&hx)?;
            feats.push(hx.clone());
            if i + 2 < height {
                hx = hx.max_pool2d_with_stride(2, 2)?;
            }
        }

        let mut d = feats[height - 1].clone();
        for (j, conv) in self.dec.iter().enumerate() {
            let skip = &feats[height - 2 - j];
            d = conv.forward(&Tensor::cat(&[&d, skip], 1)?)?;
            if j + 1 < self.dec.len() {
                d = upsample_like(&d, &feats[height - 3 - j])?;
            }
        }

        Ok((d + hx_in)?)
    }
}

/// The dilated RSU variant (RSU-4F): same skip pattern as [`Rsu`] but with
/// growing dilation rates in place of pooling, so every feature map keeps
/// the input resolution.
struct RsuDilated {
    conv_in: RebnConv,
    enc: Vec<RebnConv>,
    dec: Vec<RebnConv>,
}

impl RsuDilated {
    fn load(in_ch: usize, mid_ch: usize, out_ch: usize, vb: VarBuilder) -> Result<Self> {
        let conv_in = RebnConv::load(in_ch, out_ch, 1, vb.pp("rebnconvin"))?;
        let mut enc = Vec::with_capacity(4);
        for (i, dilation) in [1usize, 2, 4, 8].into_iter().enumerate() {
            let ic = if i == 0 { out_ch } else { mid_ch };
            enc.push(RebnConv::load(ic, mid_ch, dilation, vb.pp(format!("rebnconv{}", i + 1)))?);
        }
        let mut dec = Vec::with_capacity(3);
        for (i, dilation) in [(3usize, 4usize), (2, 2), (1, 1)] {
            let oc = if i == 1 { out_ch } else { mid_ch };
            dec.push(RebnConv::load(mid_ch * 2, oc, dilation, vb.pp(format!("rebnconv{i}d")))?);
        }
        Ok(Self { conv_in, enc, dec })
    }

    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let hx_in = self.conv_in.forward(x)?;

        let mut feats = Vec::with_capacity(self.enc.len());
        let mut hx = hx_in.clone();
        for conv in &self.enc {
            hx = conv.forward(&hx)?;
            feats.push(hx.clone());
        }

        let mut d = feats[feats.len() - 1].clone();
        for (j, conv) in self.dec.iter().enumerate() {
            let skip = &feats[feats.len() - 2 - j];
            d = conv.forward(&Tensor::cat(&[&d, skip], 1)?)?;
        }

        Ok((d + hx_in)?)
    }
}

enum Stage {
    Rsu(Rsu),
    Dilated(RsuDilated),
}

impl Stage {
    fn load(spec: StageSpec, vb: VarBuilder) -> Result<Self> {
        if spec.dilated {
            Ok(Self::Dilated(RsuDilated::load(
                spec.in_ch, spec.mid_ch, spec.out_ch, vb,
            )?))
        } else {
            Ok(Self::Rsu(Rsu::load(
                spec.height, spec.in_ch, spec.mid_ch, spec.out_ch, vb,
            )?))
        }
    }

    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        match self {
            Self::Rsu(block) => block.forward(x),
            Self::Dilated(block) => block.forward(x),
        }
    }
}

/// The full network: encoder stages 1-6, decoder stages 5d-1d, side
/// outputs, and the fusion conv.
pub struct U2Net {
    stages: Vec<Stage>,
    dec_stages: Vec<Stage>,
    sides: Vec<Conv2d>,
    out_conv: Conv2d,
}

impl U2Net {
    /// Builds the network for `variant`, reading weights from `vb`.
    pub fn load(variant: U2NetVariant, vb: VarBuilder) -> Result<Self> {
        let mut stages = Vec::with_capacity(6);
        for (i, spec) in variant.encoder_specs().into_iter().enumerate() {
            stages.push(Stage::load(spec, vb.pp(format!("stage{}", i + 1)))?);
        }

        let mut dec_stages = Vec::with_capacity(5);
        for (i, spec) in variant.decoder_specs().into_iter().enumerate() {
            dec_stages.push(Stage::load(spec, vb.pp(format!("stage{}d", 5 - i)))?);
        }

        let side_cfg = Conv2dConfig {
            padding: 1,
            ..Default::default()
        };
        let mut sides = Vec::with_capacity(6);
        for (i, ch) in variant.side_channels().into_iter().enumerate() {
            sides.push(conv2d(ch, 1, 3, side_cfg, vb.pp(format!("side{}", i + 1)))?);
        }

        let out_conv = conv2d(6, 1, 1, Conv2dConfig::default(), vb.pp("outconv"))?;

        Ok(Self {
            stages,
            dec_stages,
            sides,
            out_conv,
        })
    }

    /// Runs the network on a `(batch, 3, h, w)` input and returns the fused
    /// saliency map, sigmoid-activated, shape `(batch, 1, h, w)`.
    ///
    /// `h` and `w` must be divisible by 32 so pooling stays exact; callers
    /// resize to [`crate::image_ops::INPUT_SIZE`] beforehand.
    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let (_, _, h, w) = x.dims4()?;

        let mut enc_feats = Vec::with_capacity(self.stages.len());
        let mut hx = x.clone();
        for (i, stage) in self.stages.iter().enumerate() {
            hx = stage.forward(&hx)?;
            enc_feats.push(hx.clone());
            if i + 1 < self.stages.len() {
                hx = hx.max_pool2d_with_stride(2, 2)?;
            }
        }

        // side_inputs collects hx6, hx5d, .., hx1d; side convs run in
        // reverse over it.
        let mut side_inputs = vec![enc_feats[5].clone()];
        let mut d = upsample_like(&enc_feats[5], &enc_feats[4])?;
        for (j, stage) in self.dec_stages.iter().enumerate() {
            let skip = &enc_feats[4 - j];
            d = stage.forward(&Tensor::cat(&[&d, skip], 1)?)?;
            side_inputs.push(d.clone());
            if j + 1 < self.dec_stages.len() {
                d = upsample_like(&d, &enc_feats[3 - j])?;
            }
        }

        let mut side_maps = Vec::with_capacity(self.sides.len());
        for (i, side) in self.sides.iter().enumerate() {
            let feat = &side_inputs[side_inputs.len() - 1 - i];
            let mut map = side.forward(feat)?;
            let (_, _, mh, mw) = map.dims4()?;
            if (mh, mw) != (h, w) {
                map = map.upsample_nearest2d(h, w)?;
            }
            side_maps.push(map);
        }

        let fused = self.out_conv.forward(&Tensor::cat(&side_maps, 1)?)?;
        Ok(candle_nn::ops::sigmoid(&fused)?)
    }
}
