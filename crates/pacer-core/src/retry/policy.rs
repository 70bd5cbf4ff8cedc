use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::kind::{FailureKind, RetryOn};
use super::sleep::{Sleeper, ThreadSleeper};
use crate::error::ConfigError;
use crate::sink::{EventSink, TracingSink};

/// Decision returned by [`RetryPolicy::decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the given delay.
    Retry(Duration),
    /// Attempt budget used up.
    Exhausted,
    /// Failure kind is not retryable.
    Terminal,
}

type ExhaustedHook = Arc<dyn Fn() + Send + Sync>;

/// Exponential backoff policy.
///
/// Immutable once built and cheap to clone; every attempt counter lives in
/// the executing call, so one policy can serve many operations concurrently.
#[derive(Clone)]
pub struct RetryPolicy {
    pub(super) max_attempts: u32,
    pub(super) initial_delay: Duration,
    pub(super) backoff_multiplier: f64,
    pub(super) max_delay: Option<Duration>,
    pub(super) retry_on: RetryOn,
    pub(super) on_exhausted: Option<ExhaustedHook>,
    pub(super) sink: Arc<dyn EventSink>,
    pub(super) sleeper: Arc<dyn Sleeper>,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("initial_delay", &self.initial_delay)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("max_delay", &self.max_delay)
            .field("retry_on", &self.retry_on)
            .field("on_exhausted", &self.on_exhausted.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicyBuilder::default().finish()
    }
}

impl RetryPolicy {
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// Maximum number of attempts (including the first).
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn backoff_multiplier(&self) -> f64 {
        self.backoff_multiplier
    }

    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay
    }

    pub fn retry_on(&self) -> &RetryOn {
        &self.retry_on
    }

    /// Delay to sleep after the `attempt`-th failure (1-based):
    /// `initial_delay * multiplier^(attempt-1)`, clamped to `max_delay` if set.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.initial_delay.is_zero() {
            return Duration::ZERO;
        }
        let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let nanos = self.initial_delay.as_nanos() as f64 * self.backoff_multiplier.powi(exp);
        let raw = if nanos.is_finite() && nanos < u64::MAX as f64 {
            Duration::from_nanos(nanos.round() as u64)
        } else {
            Duration::MAX
        };
        match self.max_delay {
            Some(cap) => raw.min(cap),
            None => raw,
        }
    }

    /// Decide what happens after `failures` failed attempts, the last of kind `kind`.
    pub fn decide(&self, failures: u32, kind: FailureKind) -> RetryDecision {
        if !self.retry_on.is_retryable(kind) {
            return RetryDecision::Terminal;
        }
        if failures >= self.max_attempts {
            return RetryDecision::Exhausted;
        }
        RetryDecision::Retry(self.delay_for(failures))
    }
}

/// Builder for [`RetryPolicy`]. Defaults: 3 attempts, 1s initial delay,
/// multiplier 2.0, uncapped, every failure kind retried.
pub struct RetryPolicyBuilder {
    max_attempts: u32,
    initial_delay: Duration,
    backoff_multiplier: f64,
    max_delay: Option<Duration>,
    retry_on: RetryOn,
    on_exhausted: Option<ExhaustedHook>,
    sink: Arc<dyn EventSink>,
    sleeper: Arc<dyn Sleeper>,
}

impl Default for RetryPolicyBuilder {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_delay: None,
            retry_on: RetryOn::All,
            on_exhausted: None,
            sink: Arc::new(TracingSink),
            sleeper: Arc::new(ThreadSleeper),
        }
    }
}

impl RetryPolicyBuilder {
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Upper bound on any single backoff delay.
    pub fn max_delay(mut self, cap: Option<Duration>) -> Self {
        self.max_delay = cap;
        self
    }

    pub fn retry_on(mut self, retry_on: RetryOn) -> Self {
        self.retry_on = retry_on;
        self
    }

    /// Called once, with no arguments, when the attempt budget runs out and
    /// before the last failure is returned.
    pub fn on_exhausted<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_exhausted = Some(Arc::new(hook));
        self
    }

    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn build(self) -> Result<RetryPolicy, ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(self.max_attempts));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(ConfigError::InvalidBackoffMultiplier(self.backoff_multiplier));
        }
        Ok(self.finish())
    }

    fn finish(self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay: self.initial_delay,
            backoff_multiplier: self.backoff_multiplier,
            max_delay: self.max_delay,
            retry_on: self.retry_on,
            on_exhausted: self.on_exhausted,
            sink: self.sink,
            sleeper: self.sleeper,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(attempts: u32, initial_ms: u64, multiplier: f64) -> RetryPolicy {
        RetryPolicy::builder()
            .max_attempts(attempts)
            .initial_delay(Duration::from_millis(initial_ms))
            .backoff_multiplier(multiplier)
            .build()
            .unwrap()
    }

    #[test]
    fn defaults() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_attempts(), 3);
        assert_eq!(p.initial_delay(), Duration::from_secs(1));
        assert_eq!(p.backoff_multiplier(), 2.0);
        assert!(p.max_delay().is_none());
        assert_eq!(p.retry_on(), &RetryOn::All);
    }

    #[test]
    fn exponential_delays() {
        let p = policy(5, 100, 2.0);
        assert_eq!(p.delay_for(1), Duration::from_millis(100));
        assert_eq!(p.delay_for(2), Duration::from_millis(200));
        assert_eq!(p.delay_for(3), Duration::from_millis(400));
        assert_eq!(p.delay_for(4), Duration::from_millis(800));
    }

    #[test]
    fn multiplier_one_is_constant() {
        let p = policy(5, 250, 1.0);
        for attempt in 1..5 {
            assert_eq!(p.delay_for(attempt), Duration::from_millis(250));
        }
    }

    #[test]
    fn delay_is_uncapped_by_default_and_saturates() {
        let p = policy(u32::MAX, 1000, 10.0);
        assert_eq!(p.delay_for(4), Duration::from_secs(1000));
        assert_eq!(p.delay_for(10_000), Duration::MAX);
    }

    #[test]
    fn delay_capped_when_configured() {
        let p = RetryPolicy::builder()
            .initial_delay(Duration::from_millis(100))
            .backoff_multiplier(10.0)
            .max_delay(Some(Duration::from_millis(500)))
            .build()
            .unwrap();
        assert_eq!(p.delay_for(1), Duration::from_millis(100));
        assert_eq!(p.delay_for(2), Duration::from_millis(500));
        assert_eq!(p.delay_for(9), Duration::from_millis(500));
    }

    #[test]
    fn zero_initial_delay_stays_zero() {
        let p = policy(3, 0, 1e300);
        assert_eq!(p.delay_for(50), Duration::ZERO);
    }

    #[test]
    fn decide_respects_max_attempts() {
        let p = policy(3, 100, 2.0);
        assert_eq!(
            p.decide(1, FailureKind::Timeout),
            RetryDecision::Retry(Duration::from_millis(100))
        );
        assert_eq!(
            p.decide(2, FailureKind::Timeout),
            RetryDecision::Retry(Duration::from_millis(200))
        );
        assert_eq!(p.decide(3, FailureKind::Timeout), RetryDecision::Exhausted);
    }

    #[test]
    fn decide_terminal_for_unlisted_kind() {
        let p = RetryPolicy::builder()
            .retry_on(RetryOn::kinds([FailureKind::Server]))
            .build()
            .unwrap();
        assert_eq!(p.decide(1, FailureKind::Other), RetryDecision::Terminal);
        // Terminal wins even when the budget is also spent.
        assert_eq!(p.decide(3, FailureKind::Other), RetryDecision::Terminal);
        assert!(matches!(p.decide(1, FailureKind::Server), RetryDecision::Retry(_)));
    }

    #[test]
    fn single_attempt_never_retries() {
        let p = policy(1, 100, 2.0);
        assert_eq!(p.decide(1, FailureKind::Timeout), RetryDecision::Exhausted);
    }

    #[test]
    fn build_rejects_zero_attempts() {
        let err = RetryPolicy::builder().max_attempts(0).build().unwrap_err();
        assert_eq!(err, ConfigError::InvalidMaxAttempts(0));
    }

    #[test]
    fn build_rejects_bad_multiplier() {
        for m in [0.5, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                RetryPolicy::builder().backoff_multiplier(m).build(),
                Err(ConfigError::InvalidBackoffMultiplier(_))
            ));
        }
    }

    #[test]
    fn debug_does_not_require_debug_collaborators() {
        let p = RetryPolicy::builder().on_exhausted(|| {}).build().unwrap();
        let s = format!("{p:?}");
        assert!(s.contains("max_attempts: 3"), "{s}");
        assert!(s.contains("on_exhausted: true"), "{s}");
    }
}
