//! Global request budget enforcement.
//!
//! A single [`RateLimiter`] owns the process-wide upstream budget: a token
//! bucket refilled in full every window, minimum spacing between dispatches,
//! and a cap on simultaneously in-flight requests. Excess requests queue in
//! arrival order. Throttle responses suspend the whole queue for the
//! server-suggested wait and the request is resubmitted, indefinitely; all
//! other upstream errors are returned to the caller untouched.

use std::future::Future;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use crate::config::RateLimitConfig;
use crate::riot::FetchError;

struct BucketState {
    tokens: u32,
    window_started: Instant,
    last_dispatch: Option<Instant>,
    suspended_until: Option<Instant>,
}

/// Token-bucket rate limiter with FIFO admission and bounded concurrency.
///
/// One instance per process, injected explicitly wherever fetches happen so
/// tests can substitute a permissive configuration.
pub struct RateLimiter {
    burst: u32,
    refill_window: Duration,
    min_spacing: Duration,
    throttle_fallback: Duration,
    // Fair mutex: waiters are admitted in arrival order.
    admission: Mutex<BucketState>,
    in_flight: Semaphore,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            burst: config.burst,
            refill_window: Duration::from_secs(config.refill_window_seconds),
            min_spacing: Duration::from_millis(config.min_spacing_ms),
            throttle_fallback: Duration::from_secs(config.throttle_fallback_seconds),
            admission: Mutex::new(BucketState {
                tokens: config.burst,
                window_started: Instant::now(),
                last_dispatch: None,
                suspended_until: None,
            }),
            in_flight: Semaphore::new(config.max_in_flight as usize),
        }
    }

    /// Run an upstream operation under the budget.
    ///
    /// `op` builds a fresh attempt future each call so a throttled attempt
    /// can be resubmitted. Every attempt consumes a token. Retries are
    /// unbounded in count; the caller bounds them with its own timeout.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        loop {
            self.admit().await;

            let _permit = self
                .in_flight
                .acquire()
                .await
                .expect("in-flight semaphore is never closed");

            match op().await {
                Err(FetchError::RateLimited { retry_after_secs }) => {
                    let wait = retry_after_secs
                        .map(Duration::from_secs)
                        .unwrap_or(self.throttle_fallback);
                    warn!(
                        "upstream throttled, suspending dispatch for {:?} and retrying",
                        wait
                    );
                    self.suspend(wait).await;
                }
                other => return other,
            }
        }
    }

    /// Wait for a budget token. Holds the admission lock across any waiting
    /// so queued requests leave in arrival order.
    async fn admit(&self) {
        let mut state = self.admission.lock().await;

        loop {
            let now = Instant::now();

            // Honor a throttle suspension before anything else.
            if let Some(until) = state.suspended_until {
                if until > now {
                    sleep_until(until).await;
                    continue;
                }
                state.suspended_until = None;
            }

            // Full refill once the window has elapsed.
            if now.duration_since(state.window_started) >= self.refill_window {
                state.tokens = self.burst;
                state.window_started = now;
            }

            if state.tokens == 0 {
                let refill_at = state.window_started + self.refill_window;
                debug!("budget exhausted, waiting for refill");
                sleep_until(refill_at).await;
                continue;
            }

            // Minimum spacing between consecutive dispatches.
            if let Some(last) = state.last_dispatch {
                let earliest = last + self.min_spacing;
                if earliest > now {
                    sleep_until(earliest).await;
                }
            }

            state.tokens -= 1;
            state.last_dispatch = Some(Instant::now());
            return;
        }
    }

    /// Suspend all dispatch until `wait` from now. Later suspensions only
    /// ever extend the deadline.
    async fn suspend(&self, wait: Duration) {
        let mut state = self.admission.lock().await;
        let until = Instant::now() + wait;
        state.suspended_until = Some(match state.suspended_until {
            Some(existing) if existing > until => existing,
            _ => until,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn config(burst: u32, window_secs: u64, spacing_ms: u64, in_flight: u32) -> RateLimitConfig {
        RateLimitConfig {
            burst,
            refill_window_seconds: window_secs,
            min_spacing_ms: spacing_ms,
            max_in_flight: in_flight,
            throttle_fallback_seconds: 10,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_passes_through() {
        let limiter = RateLimiter::new(&config(10, 60, 0, 3));

        let result = limiter.run(|| async { Ok::<_, FetchError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_errors_not_retried() {
        let limiter = RateLimiter::new(&config(10, 60, 0, 3));
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = limiter
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FetchError::NotFound) }
            })
            .await;

        assert_eq!(result.unwrap_err(), FetchError::NotFound);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_exhaustion_waits_for_refill() {
        let limiter = RateLimiter::new(&config(2, 60, 0, 3));
        let start = Instant::now();

        for _ in 0..2 {
            limiter.run(|| async { Ok::<_, FetchError>(()) }).await.unwrap();
        }
        // Third call exceeds the burst and must wait out the window.
        limiter.run(|| async { Ok::<_, FetchError>(()) }).await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_min_spacing_between_dispatches() {
        let limiter = RateLimiter::new(&config(10, 60, 500, 3));
        let start = Instant::now();

        for _ in 0..3 {
            limiter.run(|| async { Ok::<_, FetchError>(()) }).await.unwrap();
        }

        // Two gaps of at least 500ms after the first dispatch.
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_suspends_then_retries() {
        let limiter = RateLimiter::new(&config(100, 60, 0, 3));
        let attempts = Arc::new(AtomicU32::new(0));

        // Four clean calls first, so the throttle lands on the 5th
        // upstream call.
        for _ in 0..4 {
            limiter.run(|| async { Ok::<_, FetchError>(()) }).await.unwrap();
        }

        let start = Instant::now();
        let attempts_in = attempts.clone();
        let result = limiter
            .run(move || {
                let attempts = attempts_in.clone();
                async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(FetchError::RateLimited {
                            retry_after_secs: Some(3),
                        })
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        // The retried call succeeds without surfacing a throttling error,
        // and the 6th upstream call happened no earlier than the hint.
        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_without_hint_uses_fallback() {
        let limiter = RateLimiter::new(&config(100, 300, 0, 3));
        let attempts = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let attempts_in = attempts.clone();
        limiter
            .run(move || {
                let attempts = attempts_in.clone();
                async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(FetchError::RateLimited {
                            retry_after_secs: None,
                        })
                    } else {
                        Ok(())
                    }
                }
            })
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_consumes_additional_token() {
        // Burst of exactly 2: the first attempt and its retry use both
        // tokens, so a following call must wait for the refill.
        let limiter = RateLimiter::new(&config(2, 60, 0, 3));
        let attempts = Arc::new(AtomicU32::new(0));

        let attempts_in = attempts.clone();
        limiter
            .run(move || {
                let attempts = attempts_in.clone();
                async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(FetchError::RateLimited {
                            retry_after_secs: Some(1),
                        })
                    } else {
                        Ok(())
                    }
                }
            })
            .await
            .unwrap();

        let start = Instant::now();
        limiter.run(|| async { Ok::<_, FetchError>(()) }).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_cap() {
        let limiter = Arc::new(RateLimiter::new(&config(100, 60, 0, 2)));
        let current = Arc::new(AtomicU32::new(0));
        let peak = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let limiter = limiter.clone();
            let current = current.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                limiter
                    .run(|| {
                        let current = current.clone();
                        let peak = peak.clone();
                        async move {
                            let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                            peak.fetch_max(now, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            current.fetch_sub(1, Ordering::SeqCst);
                            Ok::<_, FetchError>(())
                        }
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }
}
