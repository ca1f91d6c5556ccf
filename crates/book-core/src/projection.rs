use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionContent {
    Video,
    Fallback,
}

/// Exactly one presentation state is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    Idle,
    Projecting {
        content: ProjectionContent,
        started_at: Instant,
    },
}

/// Drives the Idle/Projecting state machine and the detection cooldown.
///
/// `now` is always passed in by the caller so the cooldown and fallback
/// timeout are testable without sleeping.
pub struct Projector {
    state: Presentation,
    cooldown: Duration,
    last_detection: Option<Instant>,
}

impl Projector {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            state: Presentation::Idle,
            cooldown,
            last_detection: None,
        }
    }

    pub fn state(&self) -> Presentation {
        self.state
    }

    pub fn is_projecting(&self) -> bool {
        matches!(self.state, Presentation::Projecting { .. })
    }

    /// Elapsed projection time, `None` while idle.
    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        match self.state {
            Presentation::Projecting { started_at, .. } => {
                Some(now.duration_since(started_at))
            }
            Presentation::Idle => None,
        }
    }

    /// Keyword-match trigger, gated by the cooldown. Returns true when the
    /// projection actually started. The detection timestamp advances whenever
    /// the gate passes, even if the projection is already running.
    pub fn on_text_match(&mut self, now: Instant, video_available: bool) -> bool {
        if let Some(last) = self.last_detection {
            if now.duration_since(last) <= self.cooldown {
                return false;
            }
        }
        self.last_detection = Some(now);
        self.begin(now, video_available)
    }

    /// Manual override: same entry logic, cooldown bypassed.
    pub fn manual_trigger(&mut self, now: Instant, video_available: bool) -> bool {
        self.begin(now, video_available)
    }

    fn begin(&mut self, now: Instant, video_available: bool) -> bool {
        if self.is_projecting() {
            // Re-entrant triggers are ignored until we return to Idle
            return false;
        }

        let content = if video_available {
            ProjectionContent::Video
        } else {
            ProjectionContent::Fallback
        };
        self.state = Presentation::Projecting {
            content,
            started_at: now,
        };
        tracing::info!(?content, "projection started");
        true
    }

    /// Advance the state machine. `video_done` is the player's completion
    /// flag and is only consulted while video content is up; fallback content
    /// ends when its scripted duration is exhausted. Returns true when the
    /// projection ended on this call.
    pub fn tick(&mut self, now: Instant, video_done: bool, fallback_total: Duration) -> bool {
        let Presentation::Projecting {
            content,
            started_at,
        } = self.state
        else {
            return false;
        };

        let ended = match content {
            ProjectionContent::Video => video_done,
            ProjectionContent::Fallback => now.duration_since(started_at) > fallback_total,
        };

        if ended {
            self.state = Presentation::Idle;
            tracing::info!(?content, "projection ended");
        }
        ended
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_secs(2);
    const FALLBACK_TOTAL: Duration = Duration::from_secs(10);

    #[test]
    fn first_match_triggers() {
        let mut p = Projector::new(COOLDOWN);
        let now = Instant::now();
        assert!(p.on_text_match(now, true));
        assert_eq!(
            p.state(),
            Presentation::Projecting {
                content: ProjectionContent::Video,
                started_at: now
            }
        );
    }

    #[test]
    fn cooldown_suppresses_second_match() {
        let mut p = Projector::new(COOLDOWN);
        let t0 = Instant::now();
        assert!(p.on_text_match(t0, false));

        // Within the cooldown the gate closes
        assert!(!p.on_text_match(t0 + Duration::from_secs(1), false));

        // Past the cooldown the gate reopens (projection has ended by then)
        assert!(p.tick(t0 + Duration::from_secs(11), false, FALLBACK_TOTAL));
        assert!(p.on_text_match(t0 + Duration::from_secs(12), false));
    }

    #[test]
    fn reentrant_trigger_keeps_state_and_start_time() {
        let mut p = Projector::new(COOLDOWN);
        let t0 = Instant::now();
        assert!(p.on_text_match(t0, true));
        let before = p.state();

        // Cooldown has passed but the projection is still running
        assert!(!p.on_text_match(t0 + Duration::from_secs(3), true));
        assert!(!p.manual_trigger(t0 + Duration::from_secs(3), true));
        assert_eq!(p.state(), before);
    }

    #[test]
    fn manual_trigger_bypasses_cooldown() {
        let short_total = Duration::from_secs(1);
        let mut p = Projector::new(COOLDOWN);
        let t0 = Instant::now();
        assert!(p.on_text_match(t0, false));
        assert!(p.tick(t0 + Duration::from_millis(1500), false, short_total));

        // Idle again but still inside the cooldown window
        let t1 = t0 + Duration::from_millis(1800);
        assert!(!p.on_text_match(t1, false));
        assert!(p.manual_trigger(t1, false));
    }

    #[test]
    fn fallback_chosen_without_video() {
        let mut p = Projector::new(COOLDOWN);
        let now = Instant::now();
        assert!(p.manual_trigger(now, false));
        assert!(matches!(
            p.state(),
            Presentation::Projecting {
                content: ProjectionContent::Fallback,
                ..
            }
        ));
    }

    #[test]
    fn video_ends_on_completion_flag() {
        let mut p = Projector::new(COOLDOWN);
        let t0 = Instant::now();
        p.manual_trigger(t0, true);
        assert!(!p.tick(t0 + Duration::from_secs(1), false, FALLBACK_TOTAL));
        assert!(p.tick(t0 + Duration::from_secs(2), true, FALLBACK_TOTAL));
        assert_eq!(p.state(), Presentation::Idle);
    }

    #[test]
    fn fallback_ends_after_total_duration() {
        let mut p = Projector::new(COOLDOWN);
        let t0 = Instant::now();
        p.manual_trigger(t0, false);
        assert!(!p.tick(t0 + FALLBACK_TOTAL, true, FALLBACK_TOTAL));
        assert!(p.tick(t0 + FALLBACK_TOTAL + Duration::from_millis(1), true, FALLBACK_TOTAL));
    }

    #[test]
    fn tick_while_idle_is_noop() {
        let mut p = Projector::new(COOLDOWN);
        assert!(!p.tick(Instant::now(), true, FALLBACK_TOTAL));
        assert_eq!(p.state(), Presentation::Idle);
    }
}
