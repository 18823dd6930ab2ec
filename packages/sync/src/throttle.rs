//! Outbound publish throttle.
//!
//! Two windows: the configured base window for idle edits, and a
//! per-frame window while a pending record is mid-gesture so remote
//! peers see drags and resizes move smoothly. A zero base window
//! disables throttling.

use std::time::{Duration, Instant};

const ACTIVE_WINDOW: Duration = Duration::from_millis(16);

#[derive(Debug)]
pub struct Throttle {
    base: Duration,
    active: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(base: Duration) -> Self {
        Throttle {
            base,
            active: ACTIVE_WINDOW,
            last: None,
        }
    }

    /// Whether a publish at `now` is allowed. `active` selects the
    /// per-frame window.
    pub fn ready(&self, now: Instant, active: bool) -> bool {
        if self.base.is_zero() {
            return true;
        }
        let window = if active { self.active } else { self.base };
        match self.last {
            None => true,
            Some(last) => now.duration_since(last) >= window,
        }
    }

    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }
}
