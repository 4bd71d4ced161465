use std::future::Future;
use std::time::Duration;

use crate::error::ApiError;

pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// How often a remote call may be retried and how long to wait in between.
///
/// The delay starts at `initial_backoff` and doubles after every retry, with
/// no jitter and no cap: 500ms, 1s, 2s, 4s, 8s for the defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
        }
    }

    /// Whether another retry is allowed after `attempt` retries already happened.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Delay before the given retry (0-indexed).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(retry))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_INITIAL_BACKOFF)
    }
}

/// Runs `op`, retrying on HTTP 429 and 500 with exponential backoff.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, op: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    with_retry_using(policy, tokio::time::sleep, op).await
}

/// [`with_retry`] with an injected sleep, so callers control the clock.
///
/// Any other failure, or a retryable one once `max_retries` is reached, is
/// returned unchanged.
pub async fn with_retry_using<T, F, Fut, S, SFut>(
    policy: &RetryPolicy,
    mut sleep: S,
    mut op: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
    S: FnMut(Duration) -> SFut,
    SFut: Future<Output = ()>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && policy.should_retry(attempt) => {
                let backoff = policy.backoff_for(attempt);
                attempt += 1;
                log::warn!(
                    "{} got HTTP {}, retry {attempt}/{} in {backoff:?}",
                    err.operation(),
                    err.status().unwrap_or_default(),
                    policy.max_retries
                );
                sleep(backoff).await;
            }
            Err(err) => return Err(err),
        }
    }
}
