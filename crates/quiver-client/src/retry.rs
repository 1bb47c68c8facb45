//! Caller-side retry for transient failures.
//!
//! The client never retries on its own. Wrap read-only or idempotent calls
//! in [`with_retry`] when a flaky network is expected:
//!
//! ```no_run
//! # async fn run(client: quiver_client::Client) -> quiver_client::ClientResult<()> {
//! use quiver_client::retry::{with_retry, RetryPolicy};
//!
//! let objects = client.objects();
//! let count = with_retry(&RetryPolicy::default(), || objects.count_records("Movie")).await?;
//! # let _ = count;
//! # Ok(())
//! # }
//! ```
//!
//! Do not wrap `create_record` or `create_records_batch`: the service has no
//! idempotency key, so a retried create can store the same record twice.

use std::future::Future;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

use crate::error::{ClientError, ClientResult};

/// Backoff settings for [`with_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// Retries after the first attempt.
    pub max_retries: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            max_retries: 3,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_delays(mut self, min_delay: Duration, max_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self.max_delay = max_delay;
        self
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries)
    }
}

/// Run `operation`, retrying with exponential backoff while it fails with a
/// transient error ([`ClientError::is_transient`]).
///
/// # Errors
/// Returns the last error once retries are exhausted, or the first
/// non-transient error.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, operation: F) -> ClientResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ClientResult<T>>,
{
    operation
        .retry(policy.backoff())
        .sleep(tokio::time::sleep)
        .when(ClientError::is_transient)
        .notify(|err: &ClientError, delay: Duration| {
            log::warn!("Retrying after {delay:?}: {err}");
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast() -> RetryPolicy {
        RetryPolicy::default().with_delays(Duration::from_millis(1), Duration::from_millis(2))
    }

    fn unreachable() -> ClientError {
        ClientError::Transport(TransportError::Connect {
            url: "http://localhost:1/".to_string(),
            message: "connection refused".to_string(),
        })
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let counter = AtomicUsize::new(0);
        let attempts = &counter;
        let result = with_retry(&fast(), || async move {
            if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(unreachable())
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_errors() {
        let counter = AtomicUsize::new(0);
        let attempts = &counter;
        let result: ClientResult<()> = with_retry(&fast(), || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::validation("bad name"))
        })
        .await;

        assert!(matches!(result, Err(ClientError::Validation { .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let counter = AtomicUsize::new(0);
        let attempts = &counter;
        let result: ClientResult<()> = with_retry(&fast().with_max_retries(2), || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(unreachable())
        })
        .await;

        assert!(result.unwrap_err().is_transient());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_none_policy_runs_once() {
        let counter = AtomicUsize::new(0);
        let attempts = &counter;
        let result = with_retry(&RetryPolicy::none(), || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(unreachable())
        })
        .await;
        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
