//! Token-bucket rate limiting.
//!
//! Tokens refill continuously at `capacity / refill_period` per second up to
//! `capacity`. Refill is applied lazily whenever the bucket is touched; there
//! is no background timer.

mod bucket;
mod guard;

pub use bucket::{RateLimiter, RateLimiterBuilder};
pub use guard::RateLimited;
