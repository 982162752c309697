use std::time::{Duration, Instant};

/// Timer for a recurring action, fired by comparing elapsed time against the last
/// firing. A late tick still fires; it never skips a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Periodic {
    interval: Duration,
    last_fired: Instant,
}

impl Periodic {
    /// Starts counting from `now`; the first firing is one interval later.
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last_fired: now,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True (and re-armed from `now`) once `interval` has elapsed.
    pub fn due(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_fired) >= self.interval {
            self.last_fired = now;
            true
        } else {
            false
        }
    }
}
