use serde::{Deserialize, Serialize};

fn default_device_path() -> String {
    "/dev/video0".to_string()
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_frame_rate() -> u32 {
    30
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CameraConfig {
    #[serde(default = "default_device_path")]
    pub device_path: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_path: default_device_path(),
            width: default_width(),
            height: default_height(),
            frame_rate: default_frame_rate(),
        }
    }
}
