//! Exponential backoff around a single fallible async call.

use std::future::Future;
use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 100;
pub const DEFAULT_MULTIPLIER: u32 = 2;
pub const DEFAULT_MAX_DELAY_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub multiplier: u32,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            multiplier: DEFAULT_MULTIPLIER,
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay_ms: u64, multiplier: u32, max_delay_ms: u64) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_millis(initial_delay_ms),
            multiplier,
            max_delay: Duration::from_millis(max_delay_ms),
        }
    }

    /// A policy that gives up after the first failure.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (zero-based):
    /// `initial_delay * multiplier^retry`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, retry: u32) -> Duration {
        let factor = u64::from(self.multiplier).saturating_pow(retry);
        let delay_ms = (self.initial_delay.as_millis() as u64).saturating_mul(factor);
        Duration::from_millis(delay_ms.min(self.max_delay.as_millis() as u64))
    }
}

/// Run `operation` until it succeeds or the policy's retries are used up.
///
/// Returns the error of the final attempt.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(retries = attempt, "upstream call succeeded after retrying");
                }
                return Ok(value);
            }
            Err(e) if attempt < policy.max_retries => {
                let sleep_for = policy.delay_for_attempt(attempt);
                attempt += 1;
                tracing::warn!(
                    error = %e,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = sleep_for.as_millis() as u64,
                    "upstream call failed, retrying with backoff"
                );
                metrics::counter!("weather_upstream_retries_total").increment(1);
                tokio::time::sleep(sleep_for).await;
            }
            Err(e) => {
                tracing::error!(error = %e, attempts = attempt + 1, "upstream call failed, giving up");
                return Err(e);
            }
        }
    }
}
