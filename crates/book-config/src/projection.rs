use serde::{Deserialize, Serialize};

fn default_video_path() -> String {
    "diaspora_video.mp4".to_string()
}

fn default_line_delay_secs() -> f32 {
    1.5
}

fn default_char_delay_secs() -> f32 {
    0.05
}

fn default_grace_secs() -> f32 {
    5.0
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Projection asset, fallback text is used when it cannot be played
    #[serde(default = "default_video_path")]
    pub video_path: String,
    /// Seconds between the start of consecutive fallback lines
    #[serde(default = "default_line_delay_secs")]
    pub line_delay_secs: f32,
    /// Seconds per revealed character in the typewriter effect
    #[serde(default = "default_char_delay_secs")]
    pub char_delay_secs: f32,
    /// Seconds the finished fallback text stays up before the projection ends
    #[serde(default = "default_grace_secs")]
    pub grace_secs: f32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            video_path: default_video_path(),
            line_delay_secs: default_line_delay_secs(),
            char_delay_secs: default_char_delay_secs(),
            grace_secs: default_grace_secs(),
        }
    }
}
