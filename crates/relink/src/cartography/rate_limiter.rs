//! Rate limiter for polite sitemap fetching.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Rate limiter that enforces concurrency limits and minimum delays.
///
/// The first request goes out immediately; every later one waits until
/// `min_delay` has passed since the previous request started.
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    min_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter.
    ///
    /// - `max_concurrent`: maximum number of concurrent requests
    /// - `min_delay_ms`: minimum milliseconds between requests
    pub fn new(max_concurrent: usize, min_delay_ms: u64) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            min_delay: Duration::from_millis(min_delay_ms),
            last_request: Mutex::new(None),
        }
    }

    /// One request at a time, `delay_ms` apart.
    pub fn sequential(delay_ms: u64) -> Self {
        Self::new(1, delay_ms)
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Acquire permission to make a request. Waits until the rate limit allows.
    pub async fn acquire(&self) -> RateLimitGuard {
        // The semaphore is never closed, so acquisition only fails after `close()`.
        let permit = self.semaphore.clone().acquire_owned().await.ok();

        {
            let mut last = self.last_request.lock().await;
            if let Some(prev) = *last {
                let elapsed = prev.elapsed();
                if elapsed < self.min_delay {
                    tokio::time::sleep(self.min_delay - elapsed).await;
                }
            }
            *last = Some(Instant::now());
        }

        RateLimitGuard { _permit: permit }
    }
}

/// Guard that releases the rate limiter permit when dropped.
pub struct RateLimitGuard {
    _permit: Option<OwnedSemaphorePermit>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_request_does_not_wait() {
        let limiter = RateLimiter::sequential(500);
        let start = std::time::Instant::now();
        let _g = limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_delay_between_requests() {
        let limiter = RateLimiter::sequential(50);
        let start = std::time::Instant::now();
        drop(limiter.acquire().await);
        drop(limiter.acquire().await);
        drop(limiter.acquire().await);
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_zero_delay() {
        let limiter = RateLimiter::new(2, 0);
        let _g1 = limiter.acquire().await;
        let _g2 = limiter.acquire().await;
        assert_eq!(limiter.min_delay(), Duration::ZERO);
    }
}
