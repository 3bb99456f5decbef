//! Sliding-window rate limiting shared by every outbound request.
//!
//! One [`RateLimiter`] is created per process (or per test) and handed to the
//! [`Fetcher`](crate::fetcher::Fetcher) as an `Arc`, so the budget applies
//! across all sources and all concurrent batches rather than per caller.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use bailiwick_news::rate_limiter::RateLimiter;
//!
//! # async fn example() {
//! let limiter = Arc::new(RateLimiter::new(5, Duration::from_secs(2)));
//! limiter.acquire().await;
//! # }
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, instrument};

/// Default number of requests allowed per window.
pub const DEFAULT_MAX_REQUESTS: usize = 5;

/// Default window length.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(2);

/// Caps requests at `max_requests` per sliding `period`.
///
/// `RateLimiter` is `Send + Sync`; wrap it in `Arc` and share it between
/// tasks. Timestamps of granted slots are kept in a queue under a
/// `tokio::sync::Mutex`, which is never held across a sleep.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    period: Duration,
    disabled: bool,
    granted: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter allowing `max_requests` per `period`.
    ///
    /// A `max_requests` of zero is treated as one so that callers never
    /// deadlock.
    #[must_use]
    pub fn new(max_requests: usize, period: Duration) -> Self {
        let max_requests = max_requests.max(1);
        debug!(max_requests, period_ms = period.as_millis() as u64, "creating rate limiter");
        Self {
            max_requests,
            period,
            disabled: false,
            granted: Mutex::new(VecDeque::with_capacity(max_requests)),
        }
    }

    /// A limiter that never waits.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_requests: usize::MAX,
            period: Duration::ZERO,
            disabled: true,
            granted: Mutex::new(VecDeque::new()),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Waits until a request slot is free and claims it.
    #[instrument(level = "trace", skip_all)]
    pub async fn acquire(&self) {
        if self.disabled {
            return;
        }

        loop {
            let wait = {
                let mut granted = self.granted.lock().await;
                let now = Instant::now();

                while let Some(&oldest) = granted.front() {
                    if now.duration_since(oldest) >= self.period {
                        granted.pop_front();
                    } else {
                        break;
                    }
                }

                if granted.len() < self.max_requests {
                    granted.push_back(now);
                    return;
                }

                // Window is full: the oldest slot frees up first.
                match granted.front() {
                    Some(&oldest) => self.period.saturating_sub(now.duration_since(oldest)),
                    None => Duration::ZERO,
                }
            };

            debug!(wait_ms = wait.as_millis() as u64, "rate limit reached; waiting");
            sleep(wait).await;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_first_burst_is_immediate() {
        let limiter = RateLimiter::new(5, Duration::from_secs(2));
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sixth_request_waits_for_window() {
        let limiter = RateLimiter::new(5, Duration::from_secs(2));
        let start = Instant::now();
        for _ in 0..6 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_is_shared_across_tasks() {
        let limiter = Arc::new(RateLimiter::new(5, Duration::from_secs(2)));
        let start = Instant::now();

        let acquisitions = (0..11).map(|_| {
            let limiter = Arc::clone(&limiter);
            async move {
                limiter.acquire().await;
                Instant::now()
            }
        });
        let mut times = futures::future::join_all(acquisitions).await;
        times.sort();

        // 11 requests at 5 per 2s need at least two full windows.
        assert!(times[10].duration_since(start) >= Duration::from_secs(4));
        for window in times.windows(6) {
            assert!(window[5].duration_since(window[0]) >= Duration::from_secs(2));
        }
    }

    #[tokio::test]
    async fn test_disabled_never_waits() {
        let limiter = RateLimiter::disabled();
        assert!(limiter.is_disabled());
        for _ in 0..100 {
            limiter.acquire().await;
        }
    }

    #[test]
    fn test_zero_budget_is_clamped() {
        let limiter = RateLimiter::new(0, Duration::from_secs(1));
        assert_eq!(limiter.max_requests(), 1);
    }
}
