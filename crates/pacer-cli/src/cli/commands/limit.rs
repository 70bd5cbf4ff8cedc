//! `pacer limit` – fire acquire calls at a token bucket.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use pacer_core::config::RateLimitConfig;
use pacer_core::{EventSink, RateLimiter};

use super::events::{choose_sink, print_events};

/// Flags for the limiter run; `None` keeps the config value.
#[derive(Debug, Clone)]
pub struct LimitOptions {
    pub requests: u32,
    pub capacity: Option<f64>,
    pub period: Option<f64>,
    pub interval_ms: u64,
    pub events: bool,
}

pub(crate) fn apply_overrides(cfg: &RateLimitConfig, opts: &LimitOptions) -> RateLimitConfig {
    RateLimitConfig {
        capacity: opts.capacity.unwrap_or(cfg.capacity),
        refill_period_secs: opts.period.unwrap_or(cfg.refill_period_secs),
    }
}

fn build_limiter(cfg: &RateLimitConfig, sink: Arc<dyn EventSink>) -> Result<RateLimiter> {
    Ok(cfg.to_builder()?.sink(sink).build()?)
}

/// Issue the calls and return each decision in order.
pub(crate) async fn drive(limiter: &RateLimiter, requests: u32, interval: Duration) -> Vec<bool> {
    let mut decisions = Vec::with_capacity(requests as usize);
    for i in 0..requests {
        if i > 0 && !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
        decisions.push(limiter.try_acquire());
    }
    decisions
}

pub async fn run_limit(cfg: &RateLimitConfig, opts: &LimitOptions) -> Result<()> {
    let cfg = apply_overrides(cfg, opts);
    let (sink, memory) = choose_sink(opts.events);
    let limiter = build_limiter(&cfg, sink)?;

    println!(
        "bucket: capacity={} refill_period={}s ({:.3} tokens/s)",
        limiter.capacity(),
        cfg.refill_period_secs,
        limiter.refill_rate()
    );
    let decisions = drive(&limiter, opts.requests, Duration::from_millis(opts.interval_ms)).await;
    for (i, granted) in decisions.iter().enumerate() {
        println!(
            "  request {:>4}: {}",
            i + 1,
            if *granted { "granted" } else { "denied" }
        );
    }
    let granted = decisions.iter().filter(|g| **g).count();
    println!(
        "granted {} / {} (tokens left {:.2})",
        granted,
        decisions.len(),
        limiter.available_tokens()
    );
    print_events(memory.as_deref());
    Ok(())
}
