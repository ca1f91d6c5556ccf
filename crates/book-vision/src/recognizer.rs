use image::GrayImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecognizerError {
    #[error("engine initialization failed: {0}")]
    Init(String),
    #[error("recognition failed: {0}")]
    Recognize(String),
}

/// Capability interface over a text-recognition engine.
///
/// The pipeline moves the instance into its worker thread; the engine is
/// dropped by the worker after its last `recognize` call, so teardown
/// happens-after worker exit. Alternate engines and test doubles substitute
/// through this trait.
pub trait TextRecognizer: Send {
    fn recognize(&mut self, image: &GrayImage) -> Result<String, RecognizerError>;
}

#[cfg(feature = "tesseract")]
mod tesseract {
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, GrayImage, ImageEncoder};
    use leptess::LepTess;

    use super::{RecognizerError, TextRecognizer};

    /// Tesseract-backed recognizer. The engine is initialized once and
    /// released when the instance drops.
    pub struct TesseractRecognizer {
        engine: LepTess,
    }

    // The engine is handed to the recognition worker at pipeline start and
    // only ever touched from that thread afterwards.
    unsafe impl Send for TesseractRecognizer {}

    impl TesseractRecognizer {
        pub fn new(language: &str) -> Result<Self, RecognizerError> {
            let engine = LepTess::new(None, language)
                .map_err(|e| RecognizerError::Init(e.to_string()))?;
            Ok(Self { engine })
        }
    }

    impl TextRecognizer for TesseractRecognizer {
        fn recognize(&mut self, image: &GrayImage) -> Result<String, RecognizerError> {
            let mut buffer = Vec::new();
            PngEncoder::new(&mut buffer)
                .write_image(
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    ExtendedColorType::L8,
                )
                .map_err(|e| RecognizerError::Recognize(e.to_string()))?;

            self.engine
                .set_image_from_mem(&buffer)
                .map_err(|e| RecognizerError::Recognize(e.to_string()))?;
            self.engine
                .get_utf8_text()
                .map_err(|e| RecognizerError::Recognize(e.to_string()))
        }
    }
}

#[cfg(feature = "tesseract")]
pub use tesseract::TesseractRecognizer;
