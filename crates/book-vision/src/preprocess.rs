use book_config::preprocess::PreprocessConfig;
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};

use crate::frame::Frame;

/// OCR preprocessing chain: grayscale, cubic upscale, light smoothing,
/// clipped contrast stretch, adaptive mean threshold, then a morphological
/// close/open to clean up speckle. Deterministic for fixed input and
/// parameters.
pub fn preprocess(frame: &Frame, params: &PreprocessConfig) -> GrayImage {
    let gray = frame.to_gray_image();

    let scale = params.scale_factor.max(1.0);
    let width = ((gray.width() as f32 * scale).round() as u32).max(1);
    let height = ((gray.height() as f32 * scale).round() as u32).max(1);
    let resized = imageops::resize(&gray, width, height, FilterType::CatmullRom);

    let smoothed = imageops::blur(&resized, 1.0);
    let stretched = stretch_contrast(&smoothed, params.contrast_clip_percent);
    let binary = adaptive_mean_threshold(&stretched, params.thresh_block_size, params.thresh_c);

    let closed = close(&binary, Norm::LInf, 1);
    open(&closed, Norm::LInf, 1)
}

/// Linear contrast stretch after discarding `clip_percent` of pixels from
/// each histogram tail. Uniform images pass through unchanged.
fn stretch_contrast(image: &GrayImage, clip_percent: f32) -> GrayImage {
    let total = image.width() as u64 * image.height() as u64;
    if total == 0 {
        return image.clone();
    }

    let mut histogram = [0u64; 256];
    for pixel in image.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let clip = ((clip_percent.clamp(0.0, 49.0) as f64 / 100.0) * total as f64) as u64;

    let mut lo = 0usize;
    let mut acc = 0u64;
    for (i, &count) in histogram.iter().enumerate() {
        acc += count;
        if acc > clip {
            lo = i;
            break;
        }
    }

    let mut hi = 255usize;
    acc = 0;
    for (i, &count) in histogram.iter().enumerate().rev() {
        acc += count;
        if acc > clip {
            hi = i;
            break;
        }
    }

    if hi <= lo {
        return image.clone();
    }

    let range = (hi - lo) as f32;
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let v = image.get_pixel(x, y)[0] as f32;
        let scaled = ((v - lo as f32) / range * 255.0).clamp(0.0, 255.0);
        Luma([scaled as u8])
    })
}

/// Binarize against the local box mean over `block_size` (forced odd) minus
/// the constant `c`, computed with an integral image so the block size does
/// not affect cost.
fn adaptive_mean_threshold(image: &GrayImage, block_size: u32, c: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let block = block_size.max(3) | 1;
    let radius = (block / 2) as i64;

    let w = width as usize;
    let h = height as usize;
    let raw = image.as_raw();

    // integral[(y + 1) * (w + 1) + (x + 1)] = sum over [0..=x, 0..=y]
    let mut integral = vec![0u64; (w + 1) * (h + 1)];
    for y in 0..h {
        let mut row = 0u64;
        for x in 0..w {
            row += raw[y * w + x] as u64;
            integral[(y + 1) * (w + 1) + (x + 1)] = integral[y * (w + 1) + (x + 1)] + row;
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let x0 = (x as i64 - radius).max(0) as usize;
        let y0 = (y as i64 - radius).max(0) as usize;
        let x1 = (x as i64 + radius).min(width as i64 - 1) as usize;
        let y1 = (y as i64 + radius).min(height as i64 - 1) as usize;

        let count = ((x1 - x0 + 1) * (y1 - y0 + 1)) as f32;
        let sum = (integral[(y1 + 1) * (w + 1) + (x1 + 1)] + integral[y0 * (w + 1) + x0])
            - integral[y0 * (w + 1) + (x1 + 1)]
            - integral[(y1 + 1) * (w + 1) + x0];
        let mean = sum as f32 / count;

        if image.get_pixel(x, y)[0] as f32 > mean - c {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PixelFormat;

    fn uniform_frame(value: u8) -> Frame {
        Frame::new(32, 24, PixelFormat::Gray, vec![value; 32 * 24])
    }

    #[test]
    fn uniform_input_is_deterministic() {
        let frame = uniform_frame(128);
        let params = PreprocessConfig::default();

        let first = preprocess(&frame, &params);
        let second = preprocess(&frame, &params);
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn uniform_input_thresholds_to_white() {
        // Every pixel sits above its local mean minus C, so the whole
        // uniform image binarizes white.
        let frame = uniform_frame(128);
        let params = PreprocessConfig::default();

        let output = preprocess(&frame, &params);
        assert!(output.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn output_scales_by_factor() {
        let frame = uniform_frame(90);
        let params = PreprocessConfig {
            scale_factor: 2.0,
            ..Default::default()
        };

        let output = preprocess(&frame, &params);
        assert_eq!(output.dimensions(), (64, 48));
    }

    #[test]
    fn even_block_size_is_forced_odd() {
        let frame = uniform_frame(128);
        let params = PreprocessConfig {
            thresh_block_size: 20,
            ..Default::default()
        };

        // Must not panic and must stay deterministic
        let first = preprocess(&frame, &params);
        let second = preprocess(&frame, &params);
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn threshold_separates_dark_text_on_bright_ground() {
        // Bright field with a dark block in the middle: the dark block must
        // come out black, the field white.
        let mut pixels = vec![200u8; 64 * 64];
        for y in 24..40 {
            for x in 24..40 {
                pixels[y * 64 + x] = 20;
            }
        }
        let image = GrayImage::from_raw(64, 64, pixels).unwrap();

        let binary = adaptive_mean_threshold(&image, 21, 10.0);
        assert_eq!(binary.get_pixel(32, 32)[0], 0);
        assert_eq!(binary.get_pixel(4, 4)[0], 255);
    }

    #[test]
    fn contrast_stretch_leaves_uniform_untouched() {
        let image = GrayImage::from_raw(8, 8, vec![77; 64]).unwrap();
        let stretched = stretch_contrast(&image, 2.0);
        assert_eq!(stretched.as_raw(), image.as_raw());
    }

    #[test]
    fn contrast_stretch_expands_narrow_range() {
        let mut pixels = vec![100u8; 64];
        pixels[..32].fill(150);
        let image = GrayImage::from_raw(8, 8, pixels).unwrap();

        let stretched = stretch_contrast(&image, 0.0);
        assert_eq!(stretched.get_pixel(0, 7)[0], 0);
        assert_eq!(stretched.get_pixel(0, 0)[0], 255);
    }
}
