use serde::{Deserialize, Serialize};

fn default_enabled() -> bool {
    true
}

fn default_submit_interval_frames() -> u64 {
    30
}

fn default_cooldown_secs() -> f32 {
    2.0
}

fn default_worker_poll_ms() -> u64 {
    100
}

fn default_language() -> String {
    "eng".to_string()
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Automatic recognition on/off, also toggleable at runtime
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// A frame is submitted for recognition at most once per this many camera frames
    #[serde(default = "default_submit_interval_frames")]
    pub submit_interval_frames: u64,
    /// Minimum seconds between two accepted keyword detections
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: f32,
    /// How long the worker blocks on the frame channel before rechecking shutdown
    #[serde(default = "default_worker_poll_ms")]
    pub worker_poll_ms: u64,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            submit_interval_frames: default_submit_interval_frames(),
            cooldown_secs: default_cooldown_secs(),
            worker_poll_ms: default_worker_poll_ms(),
            language: default_language(),
        }
    }
}
