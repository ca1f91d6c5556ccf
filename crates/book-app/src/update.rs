use std::time::{Duration, Instant};

use book_core::keywords::matches_keyword;
use book_core::projection::{Presentation, ProjectionContent, Projector};
use book_core::script::FallbackScript;
use book_core::types::AppEvent;
use book_vision::{Frame, FrameSource, RecognitionPipeline};
use kanal::AsyncReceiver;
use tokio_util::sync::CancellationToken;

use crate::video::VideoPlayer;

/// Per-tick application logic, kept apart from the async loop so tests can
/// drive it directly.
pub struct Foreground {
    pipeline: Option<RecognitionPipeline>,
    player: Box<dyn VideoPlayer>,
    projector: Projector,
    script: FallbackScript,
    fallback_total: Duration,
    submit_interval: u64,
    frame_counter: u64,
    detections: u64,
}

impl Foreground {
    pub fn new(
        pipeline: Option<RecognitionPipeline>,
        player: Box<dyn VideoPlayer>,
        projector: Projector,
        script: FallbackScript,
        submit_interval: u64,
    ) -> Self {
        let fallback_total = script.total_duration();
        Self {
            pipeline,
            player,
            projector,
            script,
            fallback_total,
            submit_interval: submit_interval.max(1),
            frame_counter: 0,
            detections: 0,
        }
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    pub fn script(&self) -> &FallbackScript {
        &self.script
    }

    /// One capture tick: count the frame and submit every Nth to recognition.
    pub fn on_frame(&mut self, frame: &Frame) {
        self.frame_counter += 1;
        if self.frame_counter % self.submit_interval == 0 {
            if let Some(pipeline) = &mut self.pipeline {
                pipeline.submit_frame(frame);
            }
        }
    }

    /// Drain at most one recognition result and run the keyword gate.
    pub fn drain_result(&mut self, now: Instant) {
        let Some(pipeline) = &mut self.pipeline else {
            return;
        };
        let Some(text) = pipeline.poll_result() else {
            return;
        };

        tracing::debug!(chars = text.len(), "recognition result");
        if matches_keyword(&text) && self.projector.on_text_match(now, self.player.is_loaded()) {
            self.detections += 1;
            tracing::info!("keyword captured");
            self.start_content();
        }
    }

    /// Advance the projection; returns to idle on video completion or
    /// fallback timeout.
    pub fn advance(&mut self, now: Instant) {
        self.projector
            .tick(now, self.player.is_done(), self.fallback_total);
    }

    /// Returns false when the application should stop.
    pub fn handle_event(&mut self, event: AppEvent, now: Instant) -> bool {
        match event {
            AppEvent::ManualTrigger => {
                tracing::info!("manual trigger activated");
                if self.projector.manual_trigger(now, self.player.is_loaded()) {
                    self.start_content();
                }
            }
            AppEvent::ToggleRecognition => match &self.pipeline {
                Some(pipeline) => {
                    let enabled = !pipeline.is_enabled();
                    pipeline.set_enabled(enabled);
                    tracing::info!(enabled, "recognition toggled");
                }
                None => tracing::warn!("no OCR engine available, recognition stays off"),
            },
            AppEvent::ShowStatus => self.log_status(),
            AppEvent::Shutdown => return false,
        }
        true
    }

    fn start_content(&mut self) {
        if matches!(
            self.projector.state(),
            Presentation::Projecting {
                content: ProjectionContent::Video,
                ..
            }
        ) {
            self.player.play_from_start();
        }
    }

    fn log_status(&self) {
        let stats = self.pipeline.as_ref().map(|p| p.stats());
        tracing::info!(
            frames = self.frame_counter,
            detections = self.detections,
            projecting = self.projector.is_projecting(),
            ?stats,
            "status"
        );
    }

    pub fn shutdown(&mut self) {
        if let Some(pipeline) = &mut self.pipeline {
            pipeline.shutdown();
        }
    }
}

/// Foreground loop: fixed-rate capture ticks interleaved with control
/// events, until cancelled or a shutdown command arrives.
pub async fn update_loop(
    mut foreground: Foreground,
    mut source: Box<dyn FrameSource + Send>,
    frame_interval: Duration,
    event_rx: AsyncReceiver<AppEvent>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let mut interval = tokio::time::interval(frame_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = event_rx.recv() => {
                if !foreground.handle_event(event?, Instant::now()) {
                    cancel.cancel();
                    break;
                }
            }
            _ = interval.tick() => {
                if let Some(frame) = source.poll_frame() {
                    foreground.on_frame(&frame);
                }
                let now = Instant::now();
                foreground.drain_result(now);
                foreground.advance(now);
            }
        }
    }

    foreground.shutdown();
    Ok(())
}
