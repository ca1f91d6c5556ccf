use image::{DynamicImage, GrayImage, RgbImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    Gray,
}

impl PixelFormat {
    pub fn channels(self) -> u32 {
        match self {
            PixelFormat::Rgb => 3,
            PixelFormat::Gray => 1,
        }
    }
}

/// An owned camera frame. Read-only once handed to the pipeline and dropped
/// after use.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, format: PixelFormat, pixels: Vec<u8>) -> Self {
        assert_eq!(
            pixels.len() as u32,
            width * height * format.channels(),
            "pixel buffer length does not match dimensions"
        );
        Self {
            width,
            height,
            format,
            pixels,
        }
    }

    pub fn to_gray_image(&self) -> GrayImage {
        match self.format {
            PixelFormat::Gray => GrayImage::from_raw(self.width, self.height, self.pixels.clone())
                .unwrap_or_else(|| GrayImage::new(self.width, self.height)),
            PixelFormat::Rgb => {
                let rgb = RgbImage::from_raw(self.width, self.height, self.pixels.clone())
                    .unwrap_or_else(|| RgbImage::new(self.width, self.height));
                DynamicImage::ImageRgb8(rgb).into_luma8()
            }
        }
    }
}
