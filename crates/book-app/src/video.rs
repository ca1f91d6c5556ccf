use std::time::Duration;

/// Playback seam for the projection asset. Decoding and rendering live
/// behind this trait; the state machine only consumes load success and the
/// completion flag.
pub trait VideoPlayer: Send {
    fn is_loaded(&self) -> bool;
    fn play_from_start(&mut self);
    fn position(&self) -> Duration;
    fn duration(&self) -> Duration;
    fn is_done(&self) -> bool;
}

/// Used when no playback backend is wired in; the projection always falls
/// back to the scripted text.
pub struct NullVideoPlayer;

impl VideoPlayer for NullVideoPlayer {
    fn is_loaded(&self) -> bool {
        false
    }

    fn play_from_start(&mut self) {}

    fn position(&self) -> Duration {
        Duration::ZERO
    }

    fn duration(&self) -> Duration {
        Duration::ZERO
    }

    fn is_done(&self) -> bool {
        true
    }
}
