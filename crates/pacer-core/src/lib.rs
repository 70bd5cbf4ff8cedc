//! Pacer: in-process execution control.
//!
//! Two independent primitives that callers compose around a unit of work:
//! [`retry::RetryPolicy`] re-runs a fallible operation with exponential
//! backoff, and [`rate_limit::RateLimiter`] gates calls with a lazily
//! refilled token bucket.

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod rate_limit;
pub mod retry;
pub mod sink;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use error::ConfigError;
pub use rate_limit::{RateLimited, RateLimiter, RateLimiterBuilder};
pub use retry::{
    Classify, FailureKind, RecordingSleeper, RetryDecision, RetryOn, RetryPolicy,
    RetryPolicyBuilder, Retrying, Sleeper, ThreadSleeper,
};
pub use sink::{EventSink, Level, MemorySink, NoopSink, TracingSink};
