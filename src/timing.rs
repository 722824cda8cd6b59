//! Millisecond-clock guards.
//!
//! All timing in the core polls a wrapping `u32` millisecond clock.  A clock
//! value smaller than the stored reference means the clock wrapped; the
//! reference is pulled forward to `now` so elapsed time never goes negative
//! or huge.

/// Elapsed milliseconds since `*since`, resetting `*since` on rollover.
pub fn elapsed_ms(since: &mut u32, now_ms: u32) -> u32 {
    if now_ms < *since {
        *since = now_ms;
    }
    now_ms - *since
}

/// Fires at most once per `period_ms`.
#[derive(Debug, Clone, Copy)]
pub struct IntervalGuard {
    last_ms: u32,
    period_ms: u32,
}

impl IntervalGuard {
    pub const fn new(period_ms: u32) -> Self {
        Self {
            last_ms: 0,
            period_ms,
        }
    }

    /// True when a full period has passed; the reference then moves to `now_ms`.
    pub fn ready(&mut self, now_ms: u32) -> bool {
        if elapsed_ms(&mut self.last_ms, now_ms) >= self.period_ms {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }

    pub fn restart(&mut self, now_ms: u32) {
        self.last_ms = now_ms;
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }
}
