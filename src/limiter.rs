//! Request pacing.
//!
//! Each worker sleeps for a fixed base delay plus uniform random jitter
//! before every HTTP attempt. Workers do not coordinate, so the effective
//! global rate is roughly `pool_size / base_delay` and there is no shared
//! token bucket to contend on.

use std::time::Duration;

use rand::Rng;

/// Per-request randomized delay.
pub struct RateLimiter {
    base: Duration,
    jitter_ms: u64,
}

impl RateLimiter {
    pub fn new(base_delay_ms: u64, jitter_ms: u64) -> Self {
        RateLimiter {
            base: Duration::from_millis(base_delay_ms),
            jitter_ms,
        }
    }

    /// Sleeps for `base + uniform(0, jitter)`.
    ///
    /// The jitter is drawn before the await so the RNG handle never
    /// crosses a suspension point.
    pub async fn acquire(&self) {
        let jitter = if self.jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::rng().random_range(0..=self.jitter_ms))
        };
        tokio::time::sleep(self.base + jitter).await;
    }
}
