//! Shared helpers for pacer-core integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use pacer_core::{ManualClock, RateLimiter, Sleeper};

/// Sleeper that advances a manual clock instead of blocking, so retry
/// backoff and limiter refill share one virtual timeline.
pub struct ClockSleeper(pub Arc<ManualClock>);

impl Sleeper for ClockSleeper {
    fn sleep(&self, duration: Duration) {
        self.0.advance(duration);
    }
}

/// Limiter on a frozen manual clock.
pub fn manual_limiter(capacity: f64, period: Duration) -> (Arc<RateLimiter>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let limiter = RateLimiter::builder()
        .capacity(capacity)
        .refill_period(period)
        .clock(clock.clone())
        .sink(Arc::new(pacer_core::NoopSink))
        .build()
        .expect("valid limiter");
    (Arc::new(limiter), clock)
}
