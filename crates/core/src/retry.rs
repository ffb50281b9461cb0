//! Retrying throttled operations with exponential backoff.

use std::time::Duration;

use backoff::backoff::Backoff;

use crate::error::Error;

/// How often and how patiently throttled operations are retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RetryPolicy {
    /// The maximum number of attempts, the first one included. `0` is
    /// treated like `1`.
    pub max_retries: u32,
    /// The delay before the second attempt. Each further delay doubles.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy.
    #[inline]
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }
}

/// Yields `initial_delay * 2^k` for at most `max_retries - 1` retries.
struct DoublingBackoff {
    policy: RetryPolicy,
    next_delay: Duration,
    remaining: u32,
}

impl DoublingBackoff {
    fn new(policy: RetryPolicy) -> Self {
        let mut this = Self {
            policy,
            next_delay: policy.initial_delay,
            remaining: 0,
        };
        this.reset();
        this
    }
}

impl Backoff for DoublingBackoff {
    fn reset(&mut self) {
        self.next_delay = self.policy.initial_delay;
        self.remaining = self.policy.max_retries.saturating_sub(1);
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let delay = self.next_delay;
        self.next_delay = self.next_delay.saturating_mul(2);
        Some(delay)
    }
}

/// Runs `operation` until it succeeds, fails with an error that is not a
/// rate limit, or runs out of attempts.
///
/// Only [`Error::is_rate_limited`] failures are retried, after sleeping for
/// the current delay. `on_retry` is called with the failure and the delay
/// right before each sleep. When all attempts are throttled, the last
/// failure is returned.
pub async fn execute<T, F, Fut, N>(
    policy: &RetryPolicy,
    mut operation: F,
    mut on_retry: N,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
    N: FnMut(&Error, Duration),
{
    backoff::future::retry_notify(
        DoublingBackoff::new(*policy),
        || {
            let fut = operation();
            async move {
                fut.await.map_err(|err| {
                    if err.is_rate_limited() {
                        backoff::Error::transient(err)
                    } else {
                        backoff::Error::permanent(err)
                    }
                })
            }
        },
        |err: Error, delay: Duration| {
            warn!("rate limit hit, waiting {delay:?} before retry: {err}");
            on_retry(&err, delay);
        },
    )
    .await
}
