pub mod frame;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod source;

pub use frame::{Frame, PixelFormat};
pub use pipeline::{PipelineStats, RecognitionPipeline};
pub use preprocess::preprocess;
pub use recognizer::{RecognizerError, TextRecognizer};
pub use source::{FrameSource, IdleSource, SyntheticSource, V4lSource};

#[cfg(feature = "tesseract")]
pub use recognizer::TesseractRecognizer;
