//! Smoothed, capped frame delta for the client frame loop

use std::time::{Duration, Instant};

/// Longest elapsed time a single frame may account for
pub const MAX_FRAME_ELAPSED: Duration = Duration::from_secs(1);

/// Averages frame deltas over the last three samples
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last: Option<Instant>,
    prev: Duration,
    prev2: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame at `now` and return the smoothed delta in seconds.
    ///
    /// The first call only starts the clock. A call with no time elapsed
    /// since the previous one produces no frame and leaves the clock as is.
    pub fn advance(&mut self, now: Instant) -> Option<f64> {
        let Some(last) = self.last else {
            self.last = Some(now);
            return None;
        };

        let elapsed = now.saturating_duration_since(last);
        if elapsed.is_zero() {
            return None;
        }

        let elapsed = elapsed.min(MAX_FRAME_ELAPSED);
        let smoothed = (elapsed + self.prev + self.prev2).as_secs_f64() / 3.0;

        self.prev2 = self.prev;
        self.prev = elapsed;
        self.last = Some(now);

        Some(smoothed)
    }
}
