// SPDX-License-Identifier: Apache-2.0
//! Exponential backoff with jitter (`spec.md` §7): up to `max_attempts`
//! tries, starting at `base_delay` and doubling, with ±20% jitter so
//! that concurrently retrying callers don't all wake up in lockstep.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts, base_delay }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.base_delay.saturating_mul(1u32 << attempt.min(16));
        let jitter_frac = rand::thread_rng().gen_range(-0.2..=0.2);
        let millis = exp.as_millis() as f64 * (1.0 + jitter_frac);
        Duration::from_millis(millis.max(0.0) as u64)
    }

    /// Run `f` up to `max_attempts` times, sleeping with backoff between
    /// failures. Returns the last error if every attempt fails.
    pub async fn retry<T, E, Fut, F>(&self, mut f: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;
        loop {
            match f(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        return Err(err);
                    }
                    let delay = self.delay_for(attempt - 1);
                    warn!(attempt, delay_ms = delay.as_millis(), "retrying after failure");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let attempts = AtomicU32::new(0);
        let result: Result<u32, &str> = policy
            .retry(|_attempt| {
                let count = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if count < 3 {
                        Err("not yet")
                    } else {
                        Ok(count)
                    }
                }
            })
            .await;
        assert_eq!(result, Ok(3));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let attempts = AtomicU32::new(0);
        let result: Result<u32, &str> = policy
            .retry(|_attempt| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async move { Err("always fails") }
            })
            .await;
        assert_eq!(result, Err("always fails"));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn delay_grows_exponentially_within_jitter_bounds() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        let d0 = policy.delay_for(0).as_millis();
        let d1 = policy.delay_for(1).as_millis();
        assert!((80..=120).contains(&d0));
        assert!((160..=240).contains(&d1));
    }
}
