//! Cooldown gate between real polls of the device.
//!
//! The SpyderWeb admin page asks that `/RAWSTATUS` is polled no more often
//! than every 10 seconds so the device's own control loop isn't blocked.

use std::time::{Duration, Instant};

/// Minimum time between two real polls of the device.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Cooldown state: the earliest instant another poll may hit the network.
#[derive(Debug, Clone)]
pub struct RateGate {
    next_allowed_at: Instant,
    interval: Duration,
}

impl RateGate {
    /// Create a gate whose first poll is always allowed.
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            next_allowed_at: now.checked_sub(interval).unwrap_or(now),
            interval,
        }
    }

    /// Whether a poll at `now` may hit the network. Does not change state.
    pub fn try_acquire(&self, now: Instant) -> bool {
        now >= self.next_allowed_at
    }

    /// Record a successful poll at `now`; the next one waits a full interval.
    pub fn advance(&mut self, now: Instant) {
        self.next_allowed_at = now + self.interval;
    }

    pub fn next_allowed_at(&self) -> Instant {
        self.next_allowed_at
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
