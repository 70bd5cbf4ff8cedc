use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::clock::{Clock, MonotonicClock};
use crate::error::ConfigError;
use crate::sink::{EventSink, TracingSink};

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Thread-safe token bucket shared by every caller contending for one quota.
///
/// The refill-and-deduct sequence runs under a single mutex, so two callers
/// racing for the last token cannot both win.
pub struct RateLimiter {
    capacity: f64,
    refill_period: Duration,
    state: Mutex<BucketState>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("capacity", &self.capacity)
            .field("refill_period", &self.refill_period)
            .field("tokens", &self.lock().tokens)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Full bucket of `capacity` tokens refilling over `refill_period`, using
    /// the process monotonic clock and the tracing sink.
    pub fn new(capacity: f64, refill_period: Duration) -> Result<Self, ConfigError> {
        Self::builder()
            .capacity(capacity)
            .refill_period(refill_period)
            .build()
    }

    pub fn builder() -> RateLimiterBuilder {
        RateLimiterBuilder::default()
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn refill_period(&self) -> Duration {
        self.refill_period
    }

    /// Tokens added per second.
    pub fn refill_rate(&self) -> f64 {
        self.capacity / self.refill_period.as_secs_f64()
    }

    /// Consume one token if available. Never blocks on tokens and never fails.
    pub fn try_acquire(&self) -> bool {
        let granted = {
            let mut state = self.lock();
            self.refill(&mut state);
            if state.tokens >= 1.0 {
                state.tokens -= 1.0;
                true
            } else {
                false
            }
        };
        if granted {
            self.sink.info("token acquired, proceeding with request");
        } else {
            self.sink.warning("rate limit exceeded, request denied");
        }
        granted
    }

    /// Current balance after applying any pending refill.
    pub fn available_tokens(&self) -> f64 {
        let mut state = self.lock();
        self.refill(&mut state);
        state.tokens
    }

    /// Estimated wait until one token is available (zero if one is now).
    pub fn time_until_available(&self) -> Duration {
        let deficit = 1.0 - self.available_tokens();
        if deficit <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(deficit / self.refill_rate()).unwrap_or(Duration::MAX)
    }

    fn refill(&self, state: &mut BucketState) {
        let now = self.clock.now();
        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_rate()).min(self.capacity);
        state.last_refill = now;
    }

    // Every update leaves the state consistent, so a poisoned lock is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, BucketState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Builder for [`RateLimiter`]. Defaults: 10 tokens per second.
pub struct RateLimiterBuilder {
    capacity: f64,
    refill_period: Duration,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
}

impl Default for RateLimiterBuilder {
    fn default() -> Self {
        Self {
            capacity: 10.0,
            refill_period: Duration::from_secs(1),
            clock: Arc::new(MonotonicClock),
            sink: Arc::new(TracingSink),
        }
    }
}

impl RateLimiterBuilder {
    pub fn capacity(mut self, capacity: f64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Time for an empty bucket to refill completely.
    pub fn refill_period(mut self, period: Duration) -> Self {
        self.refill_period = period;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn build(self) -> Result<RateLimiter, ConfigError> {
        if !self.capacity.is_finite() || self.capacity <= 0.0 {
            return Err(ConfigError::InvalidCapacity(self.capacity));
        }
        if self.refill_period.is_zero() {
            return Err(ConfigError::InvalidRefillPeriod(self.refill_period));
        }
        let now = self.clock.now();
        Ok(RateLimiter {
            capacity: self.capacity,
            refill_period: self.refill_period,
            state: Mutex::new(BucketState {
                tokens: self.capacity,
                last_refill: now,
            }),
            clock: self.clock,
            sink: self.sink,
        })
    }
}
