//! Construction-time validation errors.

use std::time::Duration;

use thiserror::Error;

/// A retry policy or rate limiter was configured with values it cannot honour.
///
/// Raised by builders and config conversions, never by `execute` or
/// `try_acquire`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("max_attempts must be at least 1 (got {0})")]
    InvalidMaxAttempts(u32),

    #[error("backoff multiplier must be a finite number >= 1.0 (got {0})")]
    InvalidBackoffMultiplier(f64),

    #[error("capacity must be a finite number > 0 (got {0})")]
    InvalidCapacity(f64),

    #[error("refill period must be greater than zero (got {0:?})")]
    InvalidRefillPeriod(Duration),

    /// A duration read from config was negative, NaN or too large.
    #[error("{field} must be a finite, non-negative number of seconds (got {value})")]
    InvalidDuration { field: &'static str, value: f64 },

    #[error("unknown failure kind '{0}'")]
    UnknownFailureKind(String),
}

/// Convert seconds from a config file into a `Duration`, rejecting values
/// `Duration::try_from_secs_f64` cannot represent.
pub(crate) fn secs_to_duration(field: &'static str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::InvalidDuration { field, value })
}
