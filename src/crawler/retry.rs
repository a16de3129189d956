//! Retry policy for fetch-and-extract steps
//!
//! Each step reports a [`StepOutcome`]. Retryable outcomes are logged and
//! retried after a uniformly random backoff; fatal outcomes end the loop at
//! once. When every attempt fails the caller's empty value is returned, so
//! callers must treat that sentinel as "nothing found".

use crate::browser::{DriverError, DriverResult};
use crate::config::CrawlerConfig;
use crate::WalkerError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Result of one attempt at a fetch step
#[derive(Debug)]
pub enum StepOutcome<T> {
    /// The step produced a value
    Ready(T),
    /// Navigation or timeout class failure; worth another attempt
    Retryable(DriverError),
    /// Any other failure; retrying would not help
    Fatal(DriverError),
}

impl<T> From<DriverResult<T>> for StepOutcome<T> {
    fn from(result: DriverResult<T>) -> Self {
        match result {
            Ok(value) => StepOutcome::Ready(value),
            Err(e) if e.is_retryable() => StepOutcome::Retryable(e),
            Err(e) => StepOutcome::Fatal(e),
        }
    }
}

/// Inclusive range of backoff delays in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl Backoff {
    /// Draws one delay uniformly from the range
    pub fn sample(&self) -> Duration {
        if self.max_secs <= self.min_secs {
            return Duration::from_secs_f64(self.min_secs.max(0.0));
        }
        let secs = rand::thread_rng().gen_range(self.min_secs..=self.max_secs);
        Duration::from_secs_f64(secs)
    }
}

/// Bounded retries with randomized backoff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            config.retry_attempts,
            Backoff {
                min_secs: config.backoff_min_secs,
                max_secs: config.backoff_max_secs,
            },
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Runs `step` up to `max_attempts` times
    ///
    /// # Arguments
    ///
    /// * `target` - What is being fetched, for log lines
    /// * `empty` - Value returned once every attempt has failed
    /// * `step` - One attempt; called again after each retryable failure
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - The first ready value, or `empty` after exhaustion
    /// * `Err(WalkerError::Fatal)` - A step failed in a non-retryable way
    pub async fn run<T, F, Fut>(&self, target: &str, empty: T, mut step: F) -> Result<T, WalkerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StepOutcome<T>>,
    {
        for attempt in 1..=self.max_attempts {
            match step().await {
                StepOutcome::Ready(value) => return Ok(value),
                StepOutcome::Fatal(source) => {
                    return Err(WalkerError::Fatal {
                        target: target.to_string(),
                        source,
                    });
                }
                StepOutcome::Retryable(e) => {
                    tracing::warn!(
                        "Attempt {}/{} failed for {}: {}",
                        attempt,
                        self.max_attempts,
                        target,
                        e
                    );
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.backoff.sample()).await;
                    }
                }
            }
        }

        tracing::error!(
            "Failed to fetch {} after {} attempts",
            target,
            self.max_attempts
        );
        Ok(empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    const NO_BACKOFF: Backoff = Backoff {
        min_secs: 0.0,
        max_secs: 0.0,
    };

    fn timeout_error() -> DriverError {
        DriverError::Timeout {
            what: "div.view_stateName__CzKvV".to_string(),
            timeout: Duration::from_millis(100),
        }
    }

    #[tokio::test]
    async fn test_always_timing_out_runs_exactly_max_attempts() {
        let policy = RetryPolicy::new(4, NO_BACKOFF);
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result = policy
            .run("state urls", Vec::<String>::new(), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                StepOutcome::Retryable(timeout_error())
            })
            .await
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let policy = RetryPolicy::new(5, NO_BACKOFF);
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result = policy
            .run("columbus", String::new(), move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    StepOutcome::Retryable(timeout_error())
                } else {
                    StepOutcome::Ready("Target Columbus 1".to_string())
                }
            })
            .await
            .unwrap();

        assert_eq!(result, "Target Columbus 1");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fatal_failure_is_not_retried() {
        let policy = RetryPolicy::new(5, NO_BACKOFF);
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result = policy
            .run("dayton", String::new(), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                StepOutcome::<String>::Fatal(DriverError::InvalidSelector("h3[".to_string()))
            })
            .await;

        assert!(matches!(result, Err(WalkerError::Fatal { ref target, .. }) if target == "dayton"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_backoff_only_between_attempts() {
        let policy = RetryPolicy::new(
            3,
            Backoff {
                min_secs: 0.1,
                max_secs: 0.1,
            },
        );

        let started = std::time::Instant::now();
        let result = policy
            .run("state urls", Vec::<String>::new(), || async {
                StepOutcome::Retryable(timeout_error())
            })
            .await
            .unwrap();
        let elapsed = started.elapsed();

        // Three attempts, two delays, nothing after the last attempt
        assert!(result.is_empty());
        assert!(elapsed >= Duration::from_millis(200), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(300), "elapsed {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_no_backoff_after_first_success() {
        let policy = RetryPolicy::new(
            3,
            Backoff {
                min_secs: 0.2,
                max_secs: 0.2,
            },
        );

        let started = std::time::Instant::now();
        let result = policy
            .run("columbus", String::new(), || async {
                StepOutcome::Ready("Target Columbus 1".to_string())
            })
            .await
            .unwrap();

        assert_eq!(result, "Target Columbus 1");
        assert!(started.elapsed() < Duration::from_millis(200));
    }

    #[test]
    fn test_outcome_from_driver_result() {
        assert!(matches!(
            StepOutcome::from(Ok::<_, DriverError>(1)),
            StepOutcome::Ready(1)
        ));
        assert!(matches!(
            StepOutcome::<()>::from(Err(timeout_error())),
            StepOutcome::Retryable(_)
        ));
        assert!(matches!(
            StepOutcome::<()>::from(Err(DriverError::NoDocument)),
            StepOutcome::Fatal(_)
        ));
    }

    #[test]
    fn test_backoff_sample_within_range() {
        let backoff = Backoff {
            min_secs: 0.5,
            max_secs: 1.0,
        };
        for _ in 0..100 {
            let delay = backoff.sample();
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_secs(1));
        }
        assert_eq!(NO_BACKOFF.sample(), Duration::ZERO);
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        assert_eq!(RetryPolicy::new(0, NO_BACKOFF).max_attempts(), 1);
    }
}
