use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::Context;
use book_config::camera::CameraConfig;
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, Format, FourCC};

use crate::frame::{Frame, PixelFormat};

/// A camera-like producer of frames. `poll_frame` never blocks and hands out
/// each frame at most once.
pub trait FrameSource {
    fn poll_frame(&mut self) -> Option<Frame>;
}

/// Stands in when no camera could be opened: no frames ever arrive and the
/// rest of the application stays idle.
pub struct IdleSource;

impl FrameSource for IdleSource {
    fn poll_frame(&mut self) -> Option<Frame> {
        None
    }
}

/// Generated frames at the configured rate, for running the installation
/// without camera hardware.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    interval: Duration,
    last_emit: Option<Instant>,
    counter: u8,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32, frame_rate: u32) -> Self {
        Self {
            width,
            height,
            interval: Duration::from_secs(1) / frame_rate.max(1),
            last_emit: None,
            counter: 0,
        }
    }
}

impl FrameSource for SyntheticSource {
    fn poll_frame(&mut self) -> Option<Frame> {
        let now = Instant::now();
        if let Some(last) = self.last_emit {
            if now.duration_since(last) < self.interval {
                return None;
            }
        }
        self.last_emit = Some(now);
        self.counter = self.counter.wrapping_add(1);

        let pixels = vec![self.counter; (self.width * self.height) as usize];
        Some(Frame::new(self.width, self.height, PixelFormat::Gray, pixels))
    }
}

/// V4L2 camera source. A capture thread keeps only the most recent frame;
/// the foreground takes it on poll.
pub struct V4lSource {
    latest: Arc<Mutex<Option<Frame>>>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl V4lSource {
    pub fn open(config: &CameraConfig) -> anyhow::Result<Self> {
        let dev = Device::with_path(&config.device_path)
            .with_context(|| format!("failed to open camera {}", config.device_path))?;

        let requested = Format::new(config.width, config.height, FourCC::new(b"YUYV"));
        let actual = dev
            .set_format(&requested)
            .context("failed to set capture format")?;
        if actual.fourcc != FourCC::new(b"YUYV") {
            anyhow::bail!("camera does not support YUYV capture");
        }

        tracing::info!(
            width = actual.width,
            height = actual.height,
            "camera initialized"
        );

        let latest: Arc<Mutex<Option<Frame>>> = Arc::new(Mutex::new(None));
        let stop = Arc::new(AtomicBool::new(false));

        let handle = std::thread::spawn({
            let latest = Arc::clone(&latest);
            let stop = Arc::clone(&stop);
            let (width, height) = (actual.width, actual.height);
            move || {
                if let Err(e) = capture_loop(dev, width, height, latest, stop) {
                    tracing::error!("camera capture loop error: {e:#}");
                }
            }
        });

        Ok(Self {
            latest,
            stop,
            handle: Some(handle),
        })
    }
}

impl FrameSource for V4lSource {
    fn poll_frame(&mut self) -> Option<Frame> {
        self.latest.lock().ok()?.take()
    }
}

impl Drop for V4lSource {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn capture_loop(
    dev: Device,
    width: u32,
    height: u32,
    latest: Arc<Mutex<Option<Frame>>>,
    stop: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let mut stream =
        Stream::with_buffers(&dev, Type::VideoCapture, 4).context("failed to create capture stream")?;

    while !stop.load(Ordering::SeqCst) {
        let (buf, _meta) = match stream.next() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("failed to capture frame: {e}");
                continue;
            }
        };

        let needed = (width * height * 2) as usize;
        if buf.len() < needed {
            tracing::warn!(len = buf.len(), needed, "short capture buffer");
            continue;
        }

        // YUYV: luma sits at every even byte
        let pixels: Vec<u8> = buf[..needed].iter().step_by(2).copied().collect();
        if let Ok(mut guard) = latest.lock() {
            *guard = Some(Frame::new(width, height, PixelFormat::Gray, pixels));
        }
    }

    Ok(())
}
