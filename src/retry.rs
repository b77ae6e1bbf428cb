//! Bounded exponential backoff around a single completion attempt.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{MentorError, MentorResult};

/// Retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Delay before the first retry; doubles for each further retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Retry configuration.
///
/// With the defaults an always-failing attempt runs 3 times, waiting
/// 500ms and then 1000ms in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Wait before retry number `attempt + 1`: `base_delay * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
    }

    /// Run `attempt_fn` until it succeeds, fails with a non-retryable error,
    /// or the retry budget is spent.
    ///
    /// `attempt_fn` receives the zero-based attempt index. Backoff sleeps
    /// race `cancel`; cancellation during a sleep returns
    /// [`MentorError::Cancelled`] without another attempt.
    pub async fn with_retry<T, F, Fut>(
        &self,
        cancel: Option<&CancellationToken>,
        mut attempt_fn: F,
    ) -> MentorResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = MentorResult<T>>,
    {
        let mut attempt = 0;
        loop {
            let err = match attempt_fn(attempt).await {
                Ok(value) => {
                    if attempt > 0 {
                        info!("Request succeeded after {} retries", attempt);
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !err.is_retryable() {
                return Err(err);
            }

            if attempt >= self.max_retries {
                warn!(
                    "Giving up after {} attempts: {}",
                    attempt + 1,
                    err
                );
                return Err(err);
            }

            let delay = self.delay_for(attempt);
            warn!(
                "Attempt {} of {} failed ({}), retrying in {}ms",
                attempt + 1,
                self.max_retries + 1,
                err.error_code(),
                delay.as_millis()
            );

            sleep_unless_cancelled(delay, cancel).await?;
            attempt += 1;
        }
    }
}

async fn sleep_unless_cancelled(
    delay: Duration,
    cancel: Option<&CancellationToken>,
) -> MentorResult<()> {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(MentorError::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        },
        None => {
            tokio::time::sleep(delay).await;
            Ok(())
        }
    }
}
