use std::time::Duration;

use book_config::projection::ProjectionConfig;

/// Text shown when no video asset is available.
pub const FALLBACK_LINES: [&str; 12] = [
    "The hidden weight of waiting...",
    "Years pass, applications pending,",
    "Dreams deferred, hopes suspended.",
    "Each rejection letter carries",
    "the weight of a thousand tomorrows",
    "that may never come.",
    "",
    "We smile in interviews,",
    "speak of integration,",
    "while our hearts ache",
    "for certainty, for home,",
    "for the right to simply... be.",
];

/// Scripted typewriter reveal: line `i` starts at `i * line_delay`, then one
/// character appears per `char_delay`. Pure timing, nothing here mutates.
#[derive(Debug, Clone)]
pub struct FallbackScript {
    lines: Vec<String>,
    line_delay: Duration,
    char_delay: Duration,
    grace: Duration,
}

impl FallbackScript {
    pub fn new(
        lines: Vec<String>,
        line_delay: Duration,
        char_delay: Duration,
        grace: Duration,
    ) -> Self {
        Self {
            lines,
            line_delay,
            char_delay,
            grace,
        }
    }

    pub fn from_config(config: &ProjectionConfig) -> Self {
        Self::new(
            FALLBACK_LINES.iter().map(|s| s.to_string()).collect(),
            Duration::from_secs_f32(config.line_delay_secs),
            Duration::from_secs_f32(config.char_delay_secs),
            Duration::from_secs_f32(config.grace_secs),
        )
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The revealed prefix of line `index` at `elapsed` since projection
    /// start, or `None` if the line has not started yet.
    pub fn visible_text(&self, index: usize, elapsed: Duration) -> Option<&str> {
        let line = self.lines.get(index)?;
        let start = self.line_delay * index as u32;
        if elapsed < start {
            return None;
        }

        let revealed = if self.char_delay.is_zero() {
            line.chars().count()
        } else {
            ((elapsed - start).as_secs_f64() / self.char_delay.as_secs_f64()) as usize
        };

        let end = line
            .char_indices()
            .nth(revealed)
            .map(|(i, _)| i)
            .unwrap_or(line.len());
        Some(&line[..end])
    }

    /// Total scripted duration plus the grace period, after which the
    /// fallback projection ends.
    pub fn total_duration(&self) -> Duration {
        self.line_delay * self.lines.len() as u32 + self.grace
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed > self.total_duration()
    }
}
