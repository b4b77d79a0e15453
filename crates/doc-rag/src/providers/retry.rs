//! Shared HTTP client construction and retry with exponential backoff

use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

/// Retry settings taken from the LLM configuration
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Delay before the retry that follows `attempt`, saturating for large attempts
    fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `operation` until it succeeds or the retries are used up
    pub async fn run<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.max_retries {
                        let delay = self.delay(attempt);
                        tracing::warn!(
                            "Request failed (attempt {}/{}), retrying in {:?}",
                            attempt + 1,
                            self.max_retries + 1,
                            delay
                        );
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::internal("retry loop finished without a result")))
    }
}

/// Build the HTTP client used by the remote providers
pub fn http_client(config: &LlmConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .pool_max_idle_per_host(5)
        .build()
        .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retries_until_success() {
        let policy = RetryPolicy {
            max_retries: 2,
            backoff: Duration::from_millis(1),
        };
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result = policy
            .run(|| async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Error::embedding("temporarily unavailable"))
                } else {
                    Ok(7)
                }
            })
            .await
            .unwrap();

        assert_eq!(result, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_returns_last_error() {
        let policy = RetryPolicy {
            max_retries: 1,
            backoff: Duration::from_millis(1),
        };
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<()> = policy
            .run(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::generation("down"))
            })
            .await;

        assert!(matches!(result, Err(Error::Generation(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_delay_doubles_and_saturates() {
        let policy = RetryPolicy {
            max_retries: 40,
            backoff: Duration::from_secs(1),
        };
        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(3), Duration::from_secs(8));
        assert_eq!(policy.delay(31), Duration::from_secs(1 << 31));
        assert_eq!(policy.delay(40), Duration::from_secs(u32::MAX as u64));
    }

    #[tokio::test]
    async fn test_many_retries_do_not_overflow() {
        let policy = RetryPolicy {
            max_retries: 40,
            backoff: Duration::ZERO,
        };
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<()> = policy
            .run(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::embedding("down"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 41);
    }
}
