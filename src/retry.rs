//! Backoff for translation provider calls.
//!
//! Retries are bounded twice: by the policy's attempt count and by the
//! deadline of the surrounding translation. A backoff that would end past
//! the deadline is never started; the last provider error is returned
//! instead.

use crate::translation::ProviderError;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// How often, and how patiently, a failed provider call is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total calls, the first one included. Zero behaves like one.
    pub attempts: u32,
    /// Pause after the first failure; doubled after every further one
    pub first_backoff: Duration,
    /// Upper bound for a single pause
    pub backoff_cap: Duration,
}

impl RetryPolicy {
    /// Three calls, pausing 1s then 2s.
    pub const fn standard() -> Self {
        Self {
            attempts: 3,
            first_backoff: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(5),
        }
    }

    pub const fn single_attempt() -> Self {
        Self {
            attempts: 1,
            first_backoff: Duration::ZERO,
            backoff_cap: Duration::ZERO,
        }
    }

    /// Same schedule with a different attempt count and first pause.
    pub fn with_attempts(self, attempts: u32, first_backoff: Duration) -> Self {
        Self {
            attempts,
            first_backoff,
            ..self
        }
    }

    /// Pause after `failures` consecutive failed calls (1 or more).
    fn backoff_after(&self, failures: u32) -> Duration {
        let doublings = failures.saturating_sub(1).min(31);
        self.first_backoff
            .saturating_mul(1u32 << doublings)
            .min(self.backoff_cap)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// Run `call` until it succeeds, fails with a non-retryable
/// [`ProviderError`], uses up `policy.attempts`, or the next backoff would
/// cross `deadline`.
pub async fn retry_provider_call<T, F, Fut>(
    policy: &RetryPolicy,
    deadline: Instant,
    label: &str,
    mut call: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let attempts = policy.attempts.max(1);
    let mut failures = 0;

    loop {
        let error = match call().await {
            Ok(value) => {
                if failures > 0 {
                    debug!("{}: succeeded after {} failed calls", label, failures);
                }
                return Ok(value);
            }
            Err(error) => error,
        };
        failures += 1;

        if !error.is_retryable() {
            debug!("{}: not retrying: {}", label, error);
            return Err(error);
        }
        if failures >= attempts {
            warn!("{}: giving up after {} calls: {}", label, attempts, error);
            return Err(error);
        }

        let pause = policy.backoff_after(failures);
        if Instant::now() + pause >= deadline {
            warn!(
                "{}: backoff of {:?} would pass the deadline, giving up: {}",
                label, pause, error
            );
            return Err(error);
        }

        warn!(
            "{}: call {}/{} failed ({}), retrying in {:?}",
            label, failures, attempts, error, pause
        );
        sleep(pause).await;
    }
}
