//! Exponential back-off for transient HTTP provider failures.
//!
//! Hugging Face answers 503 while a cold model loads and Google's endpoints
//! throttle with 429, so every HTTP provider routes its request through
//! [`retry_with_backoff`].

use std::future::Future;
use std::time::Duration;

use crate::error::ProviderError;

const MAX_DELAY: Duration = Duration::from_secs(30);

/// Floor for [`RetryPolicy::attempt_timeout`].
pub const MIN_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(250);

/// Back-off policy shared by every HTTP provider of one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl RetryPolicy {
    /// A single attempt, no retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            backoff_base_ms: 0,
        }
    }

    /// Un-jittered wait before retry number `retry` (1-based), capped at 30 s.
    #[must_use]
    pub fn base_delay(&self, retry: u32) -> Duration {
        let factor = 1u64 << retry.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor)).min(MAX_DELAY)
    }

    /// Timeout for one HTTP attempt so that every attempt plus the longest
    /// jittered back-off fits inside `stage_budget`.
    ///
    /// Never shorter than [`MIN_ATTEMPT_TIMEOUT`] (or the budget itself, if
    /// that is shorter still).
    #[must_use]
    pub fn attempt_timeout(&self, stage_budget: Duration) -> Duration {
        let worst_backoff: Duration = (1..=self.max_retries)
            .map(|retry| self.base_delay(retry).mul_f64(1.25))
            .sum();
        let attempts = self.max_retries.saturating_add(1);
        let per_attempt = stage_budget.saturating_sub(worst_backoff) / attempts;
        per_attempt.max(MIN_ATTEMPT_TIMEOUT).min(stage_budget)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_base_ms: 500,
        }
    }
}

/// Scale `delay` by a random factor in `[0.75, 1.25)`.
fn jittered(delay: Duration) -> Duration {
    delay.mul_f64(0.75 + rand::random::<f64>() * 0.5)
}

/// Await `call` until it succeeds, fails for good, or runs out of retries.
///
/// Only errors with [`ProviderError::is_retriable`] are retried.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    provider: &'static str,
    mut call: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut retry = 0u32;
    loop {
        let err = match call().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retriable() && retry < policy.max_retries => err,
            Err(err) => return Err(err),
        };
        retry += 1;
        let delay = jittered(policy.base_delay(retry));
        tracing::warn!(
            provider,
            retry,
            max_retries = policy.max_retries,
            delay_ms = delay.as_millis(),
            error = %err,
            "transient provider error, backing off"
        );
        tokio::time::sleep(delay).await;
    }
}
