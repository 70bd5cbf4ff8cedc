//! Explicit adapter for running an operation behind a limiter.

use thiserror::Error;

use super::bucket::RateLimiter;
use crate::retry::{Classify, FailureKind};

/// The limiter had no token for this call.
///
/// Classifies as [`FailureKind::Throttled`], so a retry policy can poll a
/// limiter with backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("rate limit exceeded")]
pub struct RateLimited;

impl Classify for RateLimited {
    fn failure_kind(&self) -> FailureKind {
        FailureKind::Throttled
    }
}

impl RateLimiter {
    /// `try_acquire` as a `Result`.
    pub fn check(&self) -> Result<(), RateLimited> {
        if self.try_acquire() {
            Ok(())
        } else {
            Err(RateLimited)
        }
    }

    /// Run `op` only if a token was granted.
    pub fn call<T, F>(&self, op: F) -> Result<T, RateLimited>
    where
        F: FnOnce() -> T,
    {
        self.check()?;
        Ok(op())
    }
}
