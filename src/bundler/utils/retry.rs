//! Retry policy for idempotent network calls.
//!
//! Downloads re-fetch the same file and uploads overwrite the same key, so
//! both can be repeated safely.

use std::future::Future;
use std::time::Duration;

/// How many times to attempt a network call and how long to wait between
/// attempts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Never less than 1.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each further attempt.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Policy that tries exactly once.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
        }
    }

    /// Backoff before attempt number `attempt` (1-based, so attempt 2 is
    /// the first retry).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let exponent = (attempt - 2).min(16);
        self.initial_backoff.saturating_mul(1u32 << exponent)
    }

    /// Runs `op` until it succeeds or the attempts are exhausted, returning
    /// the last error.
    pub async fn run<T, E, F, Fut>(&self, description: &str, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        self.run_if(description, op, |_| true).await
    }

    /// Like [`run`](Self::run), but only retries errors for which
    /// `retryable` returns true; any other error is returned at once.
    pub async fn run_if<T, E, F, Fut, P>(
        &self,
        description: &str,
        mut op: F,
        retryable: P,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
        P: Fn(&E) -> bool,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts && retryable(&e) => {
                    attempt += 1;
                    let delay = self.backoff_for(attempt);
                    log::warn!(
                        "{} failed ({}), retrying in {:?} (attempt {}/{})",
                        description,
                        e,
                        delay,
                        attempt,
                        attempts
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn backoff_doubles_after_first_retry() {
        let policy = RetryPolicy {
            max_attempts: 4,
            initial_backoff: Duration::from_millis(100),
        };
        assert_eq!(policy.backoff_for(1), Duration::ZERO);
        assert_eq!(policy.backoff_for(2), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(4), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn stops_after_max_attempts() {
        let calls = Cell::new(0);
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::ZERO,
        };
        let result: Result<(), String> = policy
            .run("flaky call", || {
                calls.set(calls.get() + 1);
                async { Err("boom".to_string()) }
            })
            .await;
        assert_eq!(result, Err("boom".to_string()));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn returns_first_success() {
        let calls = Cell::new(0);
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::ZERO,
        };
        let result: Result<u32, String> = policy
            .run("eventually ok", || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { if n >= 2 { Ok(n) } else { Err("not yet".into()) } }
            })
            .await;
        assert_eq!(result, Ok(2));
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = Cell::new(0);
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::ZERO,
        };
        let result: Result<(), String> = policy
            .run_if(
                "bad request",
                || {
                    calls.set(calls.get() + 1);
                    async { Err("HTTP 404".to_string()) }
                },
                |e| e.starts_with("HTTP 5"),
            )
            .await;
        assert_eq!(result, Err("HTTP 404".to_string()));
        assert_eq!(calls.get(), 1);
    }
}
