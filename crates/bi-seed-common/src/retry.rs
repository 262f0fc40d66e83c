//! Fixed-interval retry driver
//!
//! Every polling stage (API probe, login, database reachability) retries the
//! same way: a capped number of attempts with a constant pause in between.
//! There is no backoff and no jitter.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Attempt cap and pause between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    /// A policy with zero attempts still makes one attempt.
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }

    pub fn from_secs(max_attempts: u32, interval_secs: u64) -> Self {
        Self::new(max_attempts, Duration::from_secs(interval_secs))
    }

    /// Single attempt, no waiting
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

/// Returned when every attempt failed
#[derive(Error, Debug)]
pub enum RetryError<E> {
    #[error("{operation} failed after {attempts} attempt(s): {last}")]
    Exhausted {
        operation: String,
        attempts: u32,
        last: E,
    },
}

impl<E> RetryError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn into_last(self) -> E {
        match self {
            RetryError::Exhausted { last, .. } => last,
        }
    }
}

/// Run `op` until it succeeds or the policy's attempts are used up
///
/// `op` receives the 1-based attempt number. Failures are logged with the
/// attempt number and cause; the pause happens only between attempts.
pub async fn retry_fixed<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    E: Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => {
                debug!(operation, attempt, "Attempt succeeded");
                return Ok(value);
            },
            Err(e) if attempt >= max_attempts => {
                warn!(operation, attempt, max_attempts, error = %e, "Final attempt failed");
                return Err(RetryError::Exhausted {
                    operation: operation.to_string(),
                    attempts: attempt,
                    last: e,
                });
            },
            Err(e) => {
                warn!(
                    operation,
                    attempt,
                    max_attempts,
                    error = %e,
                    wait_secs = policy.interval.as_secs_f64(),
                    "Attempt failed, waiting before retry"
                );
                tokio::time::sleep(policy.interval).await;
                attempt += 1;
            },
        }
    }
}
