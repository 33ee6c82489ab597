//! Per-collector pacing between outbound requests.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum interval between consecutive requests.
///
/// Each collector owns exactly one limiter and drives it from a single
/// logical flow; the internal mutex only makes `&self` access possible, it
/// is not a fairness mechanism.
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter allowing `requests_per_second` calls per second.
    /// `requests_per_second` must be positive.
    #[must_use]
    pub fn new(requests_per_second: f64) -> Self {
        Self {
            min_interval: Duration::from_secs_f64(1.0 / requests_per_second),
            last_request: Mutex::new(None),
        }
    }

    /// Sleeps just long enough to guarantee at least `1 / rps` seconds since
    /// the previous call returned, then stamps the current time as its final
    /// action.
    pub async fn wait_if_needed(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_call_does_not_wait() {
        let limiter = RateLimiter::new(1.0);
        let before = Instant::now();
        limiter.wait_if_needed().await;
        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn second_call_waits_out_the_interval() {
        let limiter = RateLimiter::new(2.0);
        limiter.wait_if_needed().await;
        let before = Instant::now();
        limiter.wait_if_needed().await;
        assert_eq!(Instant::now() - before, Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_interval_passes_through() {
        let limiter = RateLimiter::new(2.0);
        limiter.wait_if_needed().await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        let before = Instant::now();
        limiter.wait_if_needed().await;
        assert_eq!(Instant::now(), before);
    }
}
