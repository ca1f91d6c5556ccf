use serde::{Deserialize, Serialize};

fn default_scale_factor() -> f32 {
    2.0
}

fn default_thresh_block_size() -> u32 {
    21
}

fn default_thresh_c() -> f32 {
    10.0
}

fn default_contrast_clip_percent() -> f32 {
    2.0
}

/// Parameters for the OCR image preprocessing chain.
#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Magnification applied before thresholding, small text reads better upscaled
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f32,
    /// Adaptive threshold neighborhood size, forced odd
    #[serde(default = "default_thresh_block_size")]
    pub thresh_block_size: u32,
    /// Constant subtracted from the local mean before comparison
    #[serde(default = "default_thresh_c")]
    pub thresh_c: f32,
    /// Histogram tail percentage clipped on each side during contrast stretch
    #[serde(default = "default_contrast_clip_percent")]
    pub contrast_clip_percent: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            scale_factor: default_scale_factor(),
            thresh_block_size: default_thresh_block_size(),
            thresh_c: default_thresh_c(),
            contrast_clip_percent: default_contrast_clip_percent(),
        }
    }
}
