use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use book_config::preprocess::PreprocessConfig;
use image::GrayImage;
use kanal::ReceiveErrorTimeout;

use crate::frame::Frame;
use crate::preprocess::preprocess;
use crate::recognizer::TextRecognizer;

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    skipped: AtomicU64,
    results: AtomicU64,
    errors: AtomicU64,
}

/// Snapshot of pipeline activity for status logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    pub submitted: u64,
    pub skipped: u64,
    pub results: u64,
    pub errors: u64,
}

/// Everything the worker thread takes ownership of when it starts. Keeping
/// the recognizer here until then means it is only ever touched from the
/// worker once recognition begins, and dropped by the worker on exit.
struct WorkerSeed {
    recognizer: Box<dyn TextRecognizer>,
    frame_rx: kanal::Receiver<GrayImage>,
    result_tx: kanal::Sender<String>,
}

/// Decouples fixed-rate capture from variable-latency recognition.
///
/// One preprocessed frame at most is in flight at any time: `submit_frame`
/// is a no-op while a result is pending, so the foreground loop never blocks
/// and never accumulates backlog. Frames arriving while in flight are
/// skipped on purpose; the two capacity-1 channels carry the handoff.
pub struct RecognitionPipeline {
    params: PreprocessConfig,
    worker_poll: Duration,
    enabled: AtomicBool,
    in_flight: AtomicBool,
    shutdown: Arc<AtomicBool>,
    frame_tx: kanal::Sender<GrayImage>,
    result_rx: kanal::Receiver<String>,
    worker_seed: Option<WorkerSeed>,
    worker: Option<JoinHandle<()>>,
    counters: Arc<Counters>,
}

impl RecognitionPipeline {
    pub fn new(
        recognizer: Box<dyn TextRecognizer>,
        params: PreprocessConfig,
        worker_poll: Duration,
    ) -> Self {
        let (frame_tx, frame_rx) = kanal::bounded(1);
        let (result_tx, result_rx) = kanal::bounded(1);

        Self {
            params,
            worker_poll,
            enabled: AtomicBool::new(true),
            in_flight: AtomicBool::new(false),
            shutdown: Arc::new(AtomicBool::new(false)),
            frame_tx,
            result_rx,
            worker_seed: Some(WorkerSeed {
                recognizer,
                frame_rx,
                result_tx,
            }),
            worker: None,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn is_worker_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Called once per capture tick. No-op while a submission is in flight or
    /// recognition is disabled; the producer never blocks. Starts the worker
    /// on first use.
    pub fn submit_frame(&mut self, frame: &Frame) {
        if !self.is_enabled() || self.shutdown.load(Ordering::Acquire) {
            return;
        }
        if self.in_flight.load(Ordering::Acquire) {
            self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let image = preprocess(frame, &self.params);
        self.ensure_worker();

        match self.frame_tx.try_send(image) {
            Ok(true) => {
                self.in_flight.store(true, Ordering::Release);
                self.counters.submitted.fetch_add(1, Ordering::Relaxed);
            }
            Ok(false) => {
                // Not in flight yet the slot is occupied: a stale frame from
                // before a toggle. Drop rather than block.
                self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => tracing::warn!("frame channel closed, dropping frame: {e}"),
        }
    }

    /// Non-blocking drain of the result channel, once per update tick.
    /// Clears the in-flight flag when a result arrives.
    pub fn poll_result(&mut self) -> Option<String> {
        match self.result_rx.try_recv() {
            Ok(Some(text)) => {
                self.in_flight.store(false, Ordering::Release);
                self.counters.results.fetch_add(1, Ordering::Relaxed);
                Some(text)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::debug!("result channel closed: {e}");
                None
            }
        }
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            submitted: self.counters.submitted.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
            results: self.counters.results.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
        }
    }

    fn ensure_worker(&mut self) {
        if self.worker.is_some() {
            return;
        }
        let Some(seed) = self.worker_seed.take() else {
            return;
        };

        let shutdown = Arc::clone(&self.shutdown);
        let counters = Arc::clone(&self.counters);
        let poll = self.worker_poll;
        self.worker = Some(std::thread::spawn(move || {
            worker_loop(seed, shutdown, counters, poll);
        }));
    }

    /// Signal the worker and wait for it to exit. The wait is bounded by the
    /// poll timeout plus at most one in-progress recognize call; the worker
    /// drops the recognizer after that call, so engine teardown happens-after
    /// worker exit.
    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                tracing::error!("recognition worker panicked");
            }
        }
    }
}

impl Drop for RecognitionPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(
    seed: WorkerSeed,
    shutdown: Arc<AtomicBool>,
    counters: Arc<Counters>,
    poll: Duration,
) {
    let WorkerSeed {
        mut recognizer,
        frame_rx,
        result_tx,
    } = seed;

    tracing::debug!("recognition worker started");

    while !shutdown.load(Ordering::Acquire) {
        let image = match frame_rx.recv_timeout(poll) {
            Ok(image) => image,
            Err(ReceiveErrorTimeout::Timeout) => continue,
            Err(_) => break,
        };

        // A failed pass is indistinguishable from "no text found" downstream,
        // but it is logged and counted so a dead engine shows up in the logs.
        let text = match recognizer.recognize(&image) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("recognition failed: {e}");
                counters.errors.fetch_add(1, Ordering::Relaxed);
                String::new()
            }
        };

        if result_tx.try_send(text).is_err() {
            break;
        }
    }

    tracing::debug!("recognition worker stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    use super::*;
    use crate::frame::{Frame, PixelFormat};
    use crate::recognizer::RecognizerError;

    struct MockRecognizer {
        calls: Arc<AtomicUsize>,
        delay: Duration,
        response: Result<String, String>,
    }

    impl MockRecognizer {
        fn returning(text: &str) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    calls: Arc::clone(&calls),
                    delay: Duration::ZERO,
                    response: Ok(text.to_string()),
                },
                calls,
            )
        }

        fn slow(text: &str, delay: Duration) -> (Self, Arc<AtomicUsize>) {
            let (mut mock, calls) = Self::returning(text);
            mock.delay = delay;
            (mock, calls)
        }

        fn failing(message: &str) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    calls: Arc::clone(&calls),
                    delay: Duration::ZERO,
                    response: Err(message.to_string()),
                },
                calls,
            )
        }
    }

    impl TextRecognizer for MockRecognizer {
        fn recognize(&mut self, _image: &GrayImage) -> Result<String, RecognizerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(message) => Err(RecognizerError::Recognize(message.clone())),
            }
        }
    }

    fn test_frame() -> Frame {
        Frame::new(32, 24, PixelFormat::Gray, vec![128; 32 * 24])
    }

    fn small_params() -> PreprocessConfig {
        PreprocessConfig {
            scale_factor: 1.0,
            ..Default::default()
        }
    }

    fn pipeline_with(recognizer: MockRecognizer) -> RecognitionPipeline {
        RecognitionPipeline::new(
            Box::new(recognizer),
            small_params(),
            Duration::from_millis(20),
        )
    }

    fn wait_result(pipeline: &mut RecognitionPipeline, timeout: Duration) -> Option<String> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Some(text) = pipeline.poll_result() {
                return Some(text);
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn burst_submissions_reach_recognizer_once() {
        let (mock, calls) = MockRecognizer::slow("found text", Duration::from_millis(150));
        let mut pipeline = pipeline_with(mock);

        let frame = test_frame();
        for _ in 0..5 {
            pipeline.submit_frame(&frame);
        }

        let stats = pipeline.stats();
        assert_eq!(stats.submitted, 1);
        assert_eq!(stats.skipped, 4);

        let text = wait_result(&mut pipeline, Duration::from_secs(2));
        assert_eq!(text.as_deref(), Some("found text"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn in_flight_clears_after_drain() {
        let (mock, calls) = MockRecognizer::returning("a");
        let mut pipeline = pipeline_with(mock);
        let frame = test_frame();

        pipeline.submit_frame(&frame);
        assert!(wait_result(&mut pipeline, Duration::from_secs(2)).is_some());

        pipeline.submit_frame(&frame);
        assert!(wait_result(&mut pipeline, Duration::from_secs(2)).is_some());

        assert_eq!(pipeline.stats().submitted, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn recognizer_error_becomes_empty_text() {
        let (mock, _calls) = MockRecognizer::failing("engine exploded");
        let mut pipeline = pipeline_with(mock);

        pipeline.submit_frame(&test_frame());
        let text = wait_result(&mut pipeline, Duration::from_secs(2));

        assert_eq!(text.as_deref(), Some(""));
        assert_eq!(pipeline.stats().errors, 1);
    }

    #[test]
    fn disabled_pipeline_ignores_frames() {
        let (mock, calls) = MockRecognizer::returning("never");
        let mut pipeline = pipeline_with(mock);

        pipeline.set_enabled(false);
        pipeline.submit_frame(&test_frame());

        assert!(!pipeline.is_worker_running());
        assert_eq!(pipeline.stats().submitted, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // Re-enabling resumes normal operation
        pipeline.set_enabled(true);
        pipeline.submit_frame(&test_frame());
        assert!(wait_result(&mut pipeline, Duration::from_secs(2)).is_some());
    }

    #[test]
    fn shutdown_stops_worker_and_silences_results() {
        let (mock, _calls) = MockRecognizer::returning("text");
        let mut pipeline = pipeline_with(mock);
        let frame = test_frame();

        pipeline.submit_frame(&frame);
        assert!(wait_result(&mut pipeline, Duration::from_secs(2)).is_some());
        assert!(pipeline.is_worker_running());

        pipeline.shutdown();
        assert!(!pipeline.is_worker_running());

        // Submissions after shutdown are no-ops and never produce results
        pipeline.submit_frame(&frame);
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(pipeline.poll_result(), None);
        assert_eq!(pipeline.stats().submitted, 1);
    }

    #[test]
    fn shutdown_before_first_submission() {
        let (mock, _calls) = MockRecognizer::returning("text");
        let mut pipeline = pipeline_with(mock);
        pipeline.shutdown();
        assert!(!pipeline.is_worker_running());
    }
}
