//! Bounded exponential backoff around fallible fetch operations.
//!
//! The policy runs one initial attempt plus a configured number of retries,
//! doubling the delay between attempts. There is no jitter and no delay cap;
//! callers bound total work through the attempt count instead. Whether a
//! failure is worth retrying is decided by a pluggable classifier, and the
//! wait itself goes through an injectable [`Sleeper`] so tests can observe
//! exact backoff sequences without waiting.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::error::FetchError;

/// Default retry count for GitHub API requests.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default first retry delay.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(2);

/// Something that can wait out a backoff delay.
///
/// Production code uses [`TokioSleeper`]; tests inject recorders so backoff
/// timing is observable without real waiting. The sleep is an `.await` point,
/// so dropping the surrounding future aborts an in-progress wait.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Waits for the given duration.
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the Tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Retry configuration applied around every dispatched fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled after each failed attempt.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Runs `operation` until it succeeds, fails permanently, or attempts run
    /// out.
    ///
    /// The final failure is always wrapped as [`FetchError::RetryExhausted`],
    /// whether the classifier cut the loop short or the attempt budget did;
    /// the root cause stays reachable for classification either way.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::RetryExhausted`] carrying the last failure.
    pub async fn run<T, F, Fut, C>(
        &self,
        sleeper: &dyn Sleeper,
        is_retryable: C,
        mut operation: F,
    ) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
        C: Fn(&FetchError) -> bool,
    {
        let mut backoff = self.initial_backoff;
        let mut attempts = 0u32;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    attempts += 1;
                    if attempts > self.max_retries || !is_retryable(&error) {
                        return Err(FetchError::RetryExhausted {
                            attempts,
                            cause: Box::new(error),
                        });
                    }

                    warn!(attempt = attempts, delay_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX), error = %error, "retrying after transient failure");
                    sleeper.sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                }
            }
        }
    }
}

/// Default retryable classifier.
///
/// Transient failures are: HTTP 429, HTTP 403 whose message reads like a rate
/// limit, any 5xx, request timeouts, and connect failures. Everything else,
/// including 401 and a plain 403, is permanent.
#[must_use]
pub fn is_retryable(error: &FetchError) -> bool {
    match error.root() {
        FetchError::Status { status, message } => {
            *status == 429
                || (*status == 403 && message.to_lowercase().contains("rate limit"))
                || (500..=599).contains(status)
        }
        FetchError::Timeout { .. } | FetchError::Connect { .. } => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use rstest::rstest;

    use super::{FetchError, RetryPolicy, Sleeper, is_retryable};

    /// Records requested delays instead of waiting.
    #[derive(Default)]
    struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        fn recorded(&self) -> Vec<Duration> {
            self.delays.lock().expect("sleeper mutex poisoned").clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays
                .lock()
                .expect("sleeper mutex poisoned")
                .push(duration);
        }
    }

    fn transient() -> FetchError {
        FetchError::Status {
            status: 500,
            message: "server melted".to_owned(),
        }
    }

    #[tokio::test]
    async fn success_on_first_attempt_never_sleeps() {
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy::default();

        let result = policy
            .run(&sleeper, is_retryable, || async { Ok::<_, FetchError>(7) })
            .await;

        assert_eq!(result, Ok(7));
        assert!(sleeper.recorded().is_empty());
    }

    #[tokio::test]
    async fn backoff_doubles_exactly_per_retry() {
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy {
            max_retries: 3,
            initial_backoff: Duration::from_millis(10),
        };

        let result: Result<(), FetchError> = policy
            .run(&sleeper, is_retryable, || async { Err(transient()) })
            .await;

        assert!(matches!(
            result,
            Err(FetchError::RetryExhausted { attempts: 4, .. })
        ));
        assert_eq!(
            sleeper.recorded(),
            vec![
                Duration::from_millis(10),
                Duration::from_millis(20),
                Duration::from_millis(40),
            ]
        );
    }

    #[tokio::test]
    async fn non_retryable_failure_stops_immediately() {
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy::default();

        let result: Result<(), FetchError> = policy
            .run(&sleeper, is_retryable, || async {
                Err(FetchError::Status {
                    status: 401,
                    message: "bad credentials".to_owned(),
                })
            })
            .await;

        match result {
            Err(FetchError::RetryExhausted { attempts, cause }) => {
                assert_eq!(attempts, 1);
                assert_eq!(cause.status_code(), Some(401));
            }
            other => panic!("expected RetryExhausted, got {other:?}"),
        }
        assert!(sleeper.recorded().is_empty());
    }

    #[tokio::test]
    async fn recovers_when_a_later_attempt_succeeds() {
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy {
            max_retries: 3,
            initial_backoff: Duration::from_millis(5),
        };
        let calls = Mutex::new(0u32);

        let result = policy
            .run(&sleeper, is_retryable, || async {
                let mut count = calls.lock().expect("counter mutex poisoned");
                *count += 1;
                if *count < 3 {
                    Err(transient())
                } else {
                    Ok(*count)
                }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(
            sleeper.recorded(),
            vec![Duration::from_millis(5), Duration::from_millis(10)]
        );
    }

    #[rstest]
    #[case(429, "too many requests", true)]
    #[case(403, "API rate limit exceeded for user", true)]
    #[case(403, "Rate Limit hit", true)]
    #[case(403, "resource forbidden", false)]
    #[case(401, "bad credentials", false)]
    #[case(404, "missing", false)]
    #[case(500, "internal error", true)]
    #[case(503, "unavailable", true)]
    #[case(599, "edge of the band", true)]
    #[case(400, "bad request", false)]
    fn classifies_status_errors(#[case] status: u16, #[case] message: &str, #[case] expected: bool) {
        let error = FetchError::Status {
            status,
            message: message.to_owned(),
        };
        assert_eq!(is_retryable(&error), expected, "status {status}: {message}");
    }

    #[rstest]
    #[case(FetchError::Timeout { message: "deadline".to_owned() }, true)]
    #[case(FetchError::Connect { message: "refused".to_owned() }, true)]
    #[case(FetchError::Network { message: "reset".to_owned() }, false)]
    #[case(FetchError::NotFound, false)]
    #[case(FetchError::Graphql { message: "oops".to_owned() }, false)]
    #[case(FetchError::Pagination { message: "stalled".to_owned() }, false)]
    fn classifies_non_status_errors(#[case] error: FetchError, #[case] expected: bool) {
        assert_eq!(is_retryable(&error), expected, "{error:?}");
    }

    #[test]
    fn classification_sees_through_retry_wrapping() {
        let error = FetchError::RetryExhausted {
            attempts: 1,
            cause: Box::new(transient()),
        };
        assert!(is_retryable(&error));
    }
}
