//! `pacer retry` – run a simulated flaky operation under the retry policy.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use pacer_core::config::RetryConfig;
use pacer_core::{Classify, EventSink, FailureKind, RecordingSleeper, RetryPolicy};

use super::events::{choose_sink, print_events};

/// Flags for the retry simulation; `None` keeps the config value.
#[derive(Debug, Clone)]
pub struct RetryOptions {
    pub fail_times: u32,
    pub kind: FailureKind,
    pub attempts: Option<u32>,
    pub delay: Option<f64>,
    pub multiplier: Option<f64>,
    pub max_delay: Option<f64>,
    pub retry_on: Vec<FailureKind>,
    pub dry_run: bool,
    pub events: bool,
}

/// Failure produced by the simulated operation.
#[derive(Debug)]
struct SimulatedFailure {
    kind: FailureKind,
    attempt: u32,
}

impl fmt::Display for SimulatedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "simulated {} failure on call {}", self.kind, self.attempt)
    }
}

impl Classify for SimulatedFailure {
    fn failure_kind(&self) -> FailureKind {
        self.kind
    }
}

/// What happened during one simulated run.
#[derive(Debug, PartialEq)]
pub(crate) struct RetryOutcome {
    pub succeeded: bool,
    pub calls: u32,
    pub delays: Vec<Duration>,
    pub exhausted: bool,
}

pub(crate) fn apply_overrides(cfg: &RetryConfig, opts: &RetryOptions) -> RetryConfig {
    let mut cfg = cfg.clone();
    if let Some(n) = opts.attempts {
        cfg.max_attempts = n;
    }
    if let Some(d) = opts.delay {
        cfg.initial_delay_secs = d;
    }
    if let Some(m) = opts.multiplier {
        cfg.backoff_multiplier = m;
    }
    if opts.max_delay.is_some() {
        cfg.max_delay_secs = opts.max_delay;
    }
    if !opts.retry_on.is_empty() {
        cfg.retry_on = Some(opts.retry_on.clone());
    }
    cfg
}

fn flaky(calls: &AtomicU32, fail_times: u32, kind: FailureKind) -> Result<u32, SimulatedFailure> {
    let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
    if attempt <= fail_times {
        Err(SimulatedFailure { kind, attempt })
    } else {
        Ok(attempt)
    }
}

/// Run the simulation. Dry runs use the blocking executor with a recording
/// sleeper; live runs sleep on the tokio timer.
pub(crate) async fn simulate(
    cfg: &RetryConfig,
    opts: &RetryOptions,
    sink: Arc<dyn EventSink>,
) -> Result<RetryOutcome> {
    let exhausted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&exhausted);
    let recorder = Arc::new(RecordingSleeper::new());
    let mut builder = cfg
        .to_builder()?
        .sink(sink)
        .on_exhausted(move || flag.store(true, Ordering::SeqCst));
    if opts.dry_run {
        builder = builder.sleeper(recorder.clone());
    }
    let policy: RetryPolicy = builder.build()?;

    let calls = AtomicU32::new(0);
    let result = if opts.dry_run {
        policy.execute_named("simulated", || flaky(&calls, opts.fail_times, opts.kind))
    } else {
        let calls = &calls;
        policy
            .execute_async_named("simulated", || async move {
                flaky(calls, opts.fail_times, opts.kind)
            })
            .await
    };

    let calls = calls.load(Ordering::SeqCst);
    // Every call but the last was followed by one backoff sleep.
    let delays = if opts.dry_run {
        recorder.delays()
    } else {
        (1..calls).map(|k| policy.delay_for(k)).collect()
    };
    Ok(RetryOutcome {
        succeeded: result.is_ok(),
        calls,
        delays,
        exhausted: exhausted.load(Ordering::SeqCst),
    })
}

pub async fn run_retry(cfg: &RetryConfig, opts: &RetryOptions) -> Result<()> {
    let cfg = apply_overrides(cfg, opts);
    let (sink, memory) = choose_sink(opts.events);
    let outcome = simulate(&cfg, opts, sink).await?;

    println!(
        "policy: max_attempts={} initial_delay={}s multiplier={}",
        cfg.max_attempts, cfg.initial_delay_secs, cfg.backoff_multiplier
    );
    println!(
        "result: {} after {} call(s){}",
        if outcome.succeeded { "success" } else { "failure" },
        outcome.calls,
        if outcome.exhausted { " (attempts exhausted)" } else { "" }
    );
    let delays: Vec<String> = outcome
        .delays
        .iter()
        .map(|d| format!("{:.3}s", d.as_secs_f64()))
        .collect();
    println!("backoff: [{}]", delays.join(", "));
    print_events(memory.as_deref());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacer_core::NoopSink;

    fn opts(fail_times: u32, kind: FailureKind) -> RetryOptions {
        RetryOptions {
            fail_times,
            kind,
            attempts: None,
            delay: None,
            multiplier: None,
            max_delay: None,
            retry_on: Vec::new(),
            dry_run: true,
            events: false,
        }
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let base = RetryConfig::default();
        let mut o = opts(0, FailureKind::Timeout);
        o.attempts = Some(7);
        o.retry_on = vec![FailureKind::Server];
        let cfg = apply_overrides(&base, &o);
        assert_eq!(cfg.max_attempts, 7);
        assert_eq!(cfg.initial_delay_secs, base.initial_delay_secs);
        assert_eq!(cfg.retry_on, Some(vec![FailureKind::Server]));
    }

    #[tokio::test]
    async fn dry_run_succeeds_after_failures() {
        let cfg = RetryConfig::default();
        let outcome = simulate(&cfg, &opts(2, FailureKind::Timeout), Arc::new(NoopSink))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            RetryOutcome {
                succeeded: true,
                calls: 3,
                delays: vec![Duration::from_secs(1), Duration::from_secs(2)],
                exhausted: false,
            }
        );
    }

    #[tokio::test]
    async fn dry_run_exhausts_budget() {
        let cfg = RetryConfig::default();
        let outcome = simulate(&cfg, &opts(10, FailureKind::Server), Arc::new(NoopSink))
            .await
            .unwrap();
        assert!(!outcome.succeeded);
        assert_eq!(outcome.calls, 3);
        assert!(outcome.exhausted);
    }

    #[tokio::test]
    async fn non_retryable_kind_stops_at_first_call() {
        let mut cfg = RetryConfig::default();
        cfg.retry_on = Some(vec![FailureKind::Timeout]);
        let outcome = simulate(&cfg, &opts(5, FailureKind::Other), Arc::new(NoopSink))
            .await
            .unwrap();
        assert_eq!(outcome.calls, 1);
        assert!(outcome.delays.is_empty());
        assert!(!outcome.exhausted);
    }

    #[tokio::test(start_paused = true)]
    async fn live_run_sleeps_on_timer() {
        let mut cfg = RetryConfig::default();
        cfg.initial_delay_secs = 0.5;
        let mut o = opts(1, FailureKind::Connection);
        o.dry_run = false;
        let start = tokio::time::Instant::now();
        let outcome = simulate(&cfg, &o, Arc::new(NoopSink)).await.unwrap();
        assert!(outcome.succeeded);
        assert_eq!(outcome.delays, vec![Duration::from_millis(500)]);
        assert_eq!(start.elapsed(), Duration::from_millis(500));
    }
}
