//! Integration test: many threads racing on one shared token bucket.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use pacer_core::{NoopSink, RateLimiter};

fn race(limiter: Arc<RateLimiter>, threads: usize, calls_per_thread: usize) -> usize {
    let granted = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let limiter = Arc::clone(&limiter);
            let granted = Arc::clone(&granted);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..calls_per_thread {
                    if limiter.try_acquire() {
                        granted.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    granted.load(Ordering::SeqCst)
}

#[test]
fn single_token_has_exactly_one_winner() {
    let (limiter, _clock) = common::manual_limiter(1.0, Duration::from_secs(60));
    assert_eq!(race(limiter, 32, 1), 1);
}

#[test]
fn single_token_on_real_clock_has_exactly_one_winner() {
    let limiter = RateLimiter::builder()
        .capacity(1.0)
        .refill_period(Duration::from_secs(3600))
        .sink(Arc::new(NoopSink))
        .build()
        .unwrap();
    assert_eq!(race(Arc::new(limiter), 16, 4), 1);
}

#[test]
fn grants_never_exceed_capacity_without_elapsed_time() {
    let (limiter, _clock) = common::manual_limiter(50.0, Duration::from_secs(1));
    assert_eq!(race(Arc::clone(&limiter), 8, 20), 50);
    assert_eq!(limiter.available_tokens(), 0.0);
}

#[test]
fn refill_after_race_is_shared_fairly() {
    let (limiter, clock) = common::manual_limiter(4.0, Duration::from_secs(4));
    assert_eq!(race(Arc::clone(&limiter), 4, 4), 4);
    clock.advance(Duration::from_secs(2));
    assert_eq!(race(limiter, 4, 4), 2);
}
