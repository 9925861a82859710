//! Retry policies for file moves and folder validation.

use std::io;
use std::time::Duration;

use tokio::time::sleep;

/// Wait between folder checks during the first ten failed validations.
const VALIDATION_DELAY_SHORT: Duration = Duration::from_secs(1);

/// Wait between folder checks up to the hundredth failed validation.
const VALIDATION_DELAY_MEDIUM: Duration = Duration::from_secs(10);

/// Wait between folder checks once a share has been gone for a while.
const VALIDATION_DELAY_LONG: Duration = Duration::from_secs(600);

/// Bounded fixed-delay retry for transient I/O failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first failure, before the final attempt.
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_millis(100),
        }
    }
}

/// Delay before the next folder validation after `attempt` failures so far.
pub fn validation_delay(attempt: u32) -> Duration {
    match attempt {
        0..10 => VALIDATION_DELAY_SHORT,
        10..100 => VALIDATION_DELAY_MEDIUM,
        _ => VALIDATION_DELAY_LONG,
    }
}

/// Run `op` until it succeeds, retrying `policy.attempts` times with a fixed
/// delay, then once more. The error of that last attempt is returned.
pub async fn retry_io<T>(
    policy: &RetryPolicy,
    action: &str,
    mut op: impl FnMut() -> io::Result<T>,
) -> io::Result<T> {
    for attempt in 1..=policy.attempts {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::warn!(
                    attempt,
                    attempts = policy.attempts,
                    error = %e,
                    "{action} failed, retrying"
                );
                sleep(policy.delay).await;
            }
        }
    }
    op()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_validation_delay_tiers() {
        assert_eq!(validation_delay(0), Duration::from_secs(1));
        assert_eq!(validation_delay(9), Duration::from_secs(1));
        assert_eq!(validation_delay(10), Duration::from_secs(10));
        assert_eq!(validation_delay(99), Duration::from_secs(10));
        assert_eq!(validation_delay(100), Duration::from_secs(600));
        assert_eq!(validation_delay(u32::MAX), Duration::from_secs(600));
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failure() {
        let mut calls = 0;
        let result = retry_io(&quick(5), "move", || {
            calls += 1;
            if calls < 3 {
                Err(io::Error::other("busy"))
            } else {
                Ok(calls)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_retry_makes_one_final_attempt() {
        let mut calls = 0;
        let result: io::Result<()> = retry_io(&quick(2), "move", || {
            calls += 1;
            Err(io::Error::other(format!("failure {calls}")))
        })
        .await;
        assert_eq!(calls, 3);
        assert_eq!(result.unwrap_err().to_string(), "failure 3");
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let mut calls = 0;
        let _ = retry_io(&quick(0), "move", || {
            calls += 1;
            Ok::<_, io::Error>(())
        })
        .await;
        assert_eq!(calls, 1);
    }
}
