//! Frame timing

use std::time::{Duration, Instant};

/// Tracks per-tick delta and total elapsed time
#[derive(Debug, Clone)]
pub struct Time {
    start: Instant,
    last: Instant,
    delta: Duration,
    frame_count: u64,
}

impl Time {
    /// Start timing now
    #[must_use]
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            delta: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Advance to the next tick
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta = now - self.last;
        self.last = now;
        self.frame_count += 1;
    }

    /// Time between the last two ticks
    #[must_use]
    pub const fn delta(&self) -> Duration {
        self.delta
    }

    /// Time between the last two ticks in seconds
    #[must_use]
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Time since timing started
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.last - self.start
    }

    /// Number of ticks so far
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
