//! Retry loops: run an operation until it succeeds, fails terminally, or
//! the attempt budget runs out.

use std::fmt::Display;
use std::future::Future;

use super::kind::{Classify, FailureKind};
use super::policy::{RetryDecision, RetryPolicy};

const DEFAULT_NAME: &str = "operation";

impl RetryPolicy {
    /// Run `op` under this policy, blocking the thread between attempts.
    pub fn execute<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: Classify + Display,
    {
        self.execute_named_with(DEFAULT_NAME, E::failure_kind, op)
    }

    /// Like [`execute`](Self::execute), labelling events with `name`.
    pub fn execute_named<T, E, F>(&self, name: &str, op: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: Classify + Display,
    {
        self.execute_named_with(name, E::failure_kind, op)
    }

    /// Blocking executor for error types without a [`Classify`] impl.
    pub fn execute_with<T, E, F, C>(&self, classify: C, op: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        C: Fn(&E) -> FailureKind,
        E: Display,
    {
        self.execute_named_with(DEFAULT_NAME, classify, op)
    }

    pub fn execute_named_with<T, E, F, C>(&self, name: &str, classify: C, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        C: Fn(&E) -> FailureKind,
        E: Display,
    {
        let mut failures = 0u32;
        loop {
            match op() {
                Ok(value) => {
                    self.report_success(name, failures + 1);
                    return Ok(value);
                }
                Err(err) => {
                    failures += 1;
                    match self.after_failure(name, failures, classify(&err), &err) {
                        RetryDecision::Retry(delay) => self.sleeper.sleep(delay),
                        RetryDecision::Exhausted | RetryDecision::Terminal => return Err(err),
                    }
                }
            }
        }
    }

    /// Run an async `op` under this policy. Backoff sleeps on the tokio timer,
    /// so other tasks on the runtime keep running.
    pub async fn execute_async<T, E, F, Fut>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + Display,
    {
        self.execute_async_named_with(DEFAULT_NAME, E::failure_kind, op)
            .await
    }

    pub async fn execute_async_named<T, E, F, Fut>(&self, name: &str, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + Display,
    {
        self.execute_async_named_with(name, E::failure_kind, op)
            .await
    }

    pub async fn execute_async_with<T, E, F, Fut, C>(&self, classify: C, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> FailureKind,
        E: Display,
    {
        self.execute_async_named_with(DEFAULT_NAME, classify, op)
            .await
    }

    pub async fn execute_async_named_with<T, E, F, Fut, C>(
        &self,
        name: &str,
        classify: C,
        mut op: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> FailureKind,
        E: Display,
    {
        let mut failures = 0u32;
        loop {
            match op().await {
                Ok(value) => {
                    self.report_success(name, failures + 1);
                    return Ok(value);
                }
                Err(err) => {
                    failures += 1;
                    match self.after_failure(name, failures, classify(&err), &err) {
                        RetryDecision::Retry(delay) => tokio::time::sleep(delay).await,
                        RetryDecision::Exhausted | RetryDecision::Terminal => return Err(err),
                    }
                }
            }
        }
    }

    /// Wrap `op` so that every [`Retrying::call`] runs it under this policy.
    pub fn wrap<F>(&self, name: impl Into<String>, op: F) -> Retrying<F> {
        Retrying {
            policy: self.clone(),
            name: name.into(),
            op,
        }
    }

    fn report_success(&self, name: &str, attempt: u32) {
        self.sink
            .info(&format!("'{name}' succeeded on attempt {attempt}"));
    }

    /// Log the failure, pick the next step and fire the exhaustion hook.
    fn after_failure(
        &self,
        name: &str,
        failures: u32,
        kind: FailureKind,
        err: &dyn Display,
    ) -> RetryDecision {
        self.sink
            .warning(&format!("'{name}' failed on attempt {failures} ({kind}): {err}"));
        let decision = self.decide(failures, kind);
        match decision {
            RetryDecision::Retry(delay) => {
                self.sink.info(&format!(
                    "retrying '{name}' in {:.2}s",
                    delay.as_secs_f64()
                ));
            }
            RetryDecision::Terminal => {
                self.sink
                    .warning(&format!("'{name}' hit non-retryable {kind} failure"));
            }
            RetryDecision::Exhausted => {
                self.sink
                    .error(&format!("'{name}' failed after {failures} attempts"));
                if let Some(hook) = &self.on_exhausted {
                    hook();
                }
            }
        }
        decision
    }
}

/// An operation bound to a retry policy and a name for its events.
pub struct Retrying<F> {
    policy: RetryPolicy,
    name: String,
    op: F,
}

impl<F> Retrying<F> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run the wrapped operation under the policy.
    pub fn call<T, E>(&mut self) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: Classify + Display,
    {
        self.policy.execute_named(&self.name, &mut self.op)
    }
}
