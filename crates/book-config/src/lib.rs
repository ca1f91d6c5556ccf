use std::env;

use serde::{Deserialize, Serialize};

use self::camera::CameraConfig;
use self::preprocess::PreprocessConfig;
use self::projection::ProjectionConfig;
use self::recognition::RecognitionConfig;

pub mod camera;
pub mod preprocess;
pub mod projection;
pub mod recognition;

#[derive(Serialize, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub camera: CameraConfig,
    pub preprocess: PreprocessConfig,
    pub recognition: RecognitionConfig,
    pub projection: ProjectionConfig,
}

impl Config {
    pub fn new() -> Self {
        let mut config = Config::default();

        if let Ok(device) = env::var("BOOK_CAMERA_DEVICE") {
            config.camera.device_path = device;
        }

        if let Some(interval) = env::var("BOOK_SUBMIT_INTERVAL")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.recognition.submit_interval_frames = interval;
        }

        if let Some(cooldown) = env::var("BOOK_COOLDOWN_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.recognition.cooldown_secs = cooldown;
        }

        if let Ok(path) = env::var("BOOK_VIDEO_PATH") {
            config.projection.video_path = path;
        }

        config
    }
}
