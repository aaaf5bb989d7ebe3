//! Exponential backoff gate for background loops that poll external
//! feeds, so an outage doesn't turn into a tight retry loop.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

const JITTER_RATIO: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    current: Duration,
    hold_until: Instant,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        let base = base.max(Duration::from_millis(1));
        Self {
            base,
            max: max.max(base),
            current: base,
            hold_until: Instant::now(),
        }
    }

    /// Whether the next attempt may run now.
    pub fn ready(&self) -> bool {
        Instant::now() >= self.hold_until
    }

    /// Record a success: the next attempt may run immediately.
    pub fn succeeded(&mut self) {
        self.current = self.base;
        self.hold_until = Instant::now();
    }

    /// Record a failure: doubles the hold time up to the cap and
    /// returns the (jittered) delay until the next attempt.
    pub fn failed(&mut self) -> Duration {
        self.current = self.current.saturating_mul(2).min(self.max);
        let delay = self.current + jitter(self.current);
        self.hold_until = Instant::now() + delay;
        delay
    }
}

fn jitter(delay: Duration) -> Duration {
    let span_ms = (delay.as_millis() as f64 * JITTER_RATIO) as u64;
    if span_ms == 0 {
        return Duration::ZERO;
    }
    // Cheap entropy source; this does not need to be well distributed.
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0);
    Duration::from_millis(nanos % (span_ms + 1))
}
