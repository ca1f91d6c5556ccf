use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;

use book_config::Config;
use book_core::projection::Projector;
use book_core::script::FallbackScript;
use book_vision::{FrameSource, IdleSource, RecognitionPipeline, SyntheticSource, V4lSource};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod controller;
mod input;
mod update;
mod video;

use controller::AppController;
use update::Foreground;
use video::{NullVideoPlayer, VideoPlayer};

#[derive(Parser, Debug)]
#[command(name = "diaspora-book", about = "Interactive book reading installation")]
struct Cli {
    /// Load settings from a JSON config file instead of the built-in defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Camera device path, e.g. /dev/video0
    #[arg(long)]
    device: Option<String>,

    /// Run against generated frames instead of a camera
    #[arg(long)]
    synthetic: bool,

    /// Path to the projection video asset
    #[arg(long)]
    video: Option<String>,

    /// Start with text recognition disabled
    #[arg(long)]
    no_recognition: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => Config::new(),
    };
    if let Some(device) = cli.device {
        config.camera.device_path = device;
    }
    if let Some(video) = cli.video {
        config.projection.video_path = video;
    }
    if cli.no_recognition {
        config.recognition.enabled = false;
    }

    let source = select_source(&config, cli.synthetic);
    let pipeline = build_pipeline(&config);
    let player = load_video_player(&config.projection.video_path);

    let projector = Projector::new(Duration::from_secs_f32(config.recognition.cooldown_secs));
    let script = FallbackScript::from_config(&config.projection);
    let foreground = Foreground::new(
        pipeline,
        player,
        projector,
        script,
        config.recognition.submit_interval_frames,
    );

    let frame_interval = Duration::from_secs(1) / config.camera.frame_rate.max(1);
    let controller = AppController::new();
    let mut tasks = controller.spawn_tasks(foreground, source, frame_interval);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown requested");
            controller.shutdown();
        }
        result = tasks.join_next() => {
            match result {
                Some(Ok(Ok(()))) => tracing::info!("task finished"),
                Some(Ok(Err(e))) => tracing::error!("task exited: {e:#}"),
                Some(Err(e)) => tracing::error!("task panicked: {e}"),
                None => {}
            }
            controller.shutdown();
        }
    }

    while let Some(result) = tasks.join_next().await {
        if let Ok(Err(e)) = result {
            tracing::error!("task exited: {e:#}");
        }
    }

    tracing::info!("application shutdown complete");
    Ok(())
}

fn load_config_file(path: &Path) -> anyhow::Result<Config> {
    tracing::info!(path = %path.display(), "loading config file");
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(config)
}

fn select_source(config: &Config, synthetic: bool) -> Box<dyn FrameSource + Send> {
    if synthetic {
        tracing::info!("using synthetic frame source");
        return Box::new(SyntheticSource::new(
            config.camera.width,
            config.camera.height,
            config.camera.frame_rate,
        ));
    }

    match V4lSource::open(&config.camera) {
        Ok(source) => Box::new(source),
        Err(e) => {
            tracing::error!("camera unavailable, no frames will arrive: {e:#}");
            Box::new(IdleSource)
        }
    }
}

fn build_pipeline(config: &Config) -> Option<RecognitionPipeline> {
    let recognizer = build_recognizer(&config.recognition.language)?;
    let pipeline = RecognitionPipeline::new(
        recognizer,
        config.preprocess.clone(),
        Duration::from_millis(config.recognition.worker_poll_ms),
    );
    pipeline.set_enabled(config.recognition.enabled);
    Some(pipeline)
}

#[cfg(feature = "tesseract")]
fn build_recognizer(language: &str) -> Option<Box<dyn book_vision::TextRecognizer>> {
    match book_vision::TesseractRecognizer::new(language) {
        Ok(recognizer) => {
            tracing::info!(language, "OCR engine initialized");
            Some(Box::new(recognizer))
        }
        Err(e) => {
            tracing::error!("failed to initialize OCR engine: {e}");
            None
        }
    }
}

#[cfg(not(feature = "tesseract"))]
fn build_recognizer(_language: &str) -> Option<Box<dyn book_vision::TextRecognizer>> {
    tracing::warn!("no OCR engine available, recognition permanently skipped");
    None
}

fn load_video_player(path: &str) -> Box<dyn VideoPlayer> {
    if Path::new(path).exists() {
        tracing::warn!(path, "video asset found but no playback backend is wired in");
    } else {
        tracing::warn!(path, "could not load video, falling back to scripted text");
    }
    Box::new(NullVideoPlayer)
}
