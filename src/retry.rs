//! Bounded retry with exponential backoff
//!
//! Every store call and external fetch goes through [`with_retry`]: each
//! attempt is capped by a timeout, and retryable failures back off
//! exponentially up to `max_delay` before the error is handed back.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::RetryConfig;
use crate::telemetry::{increment_counter, CounterMetric};

/// Errors that can be classified for retry
pub trait Retryable: Display {
    /// Whether another attempt may succeed
    fn is_retryable(&self) -> bool;

    /// Error produced when an attempt exceeds the policy timeout
    fn timed_out(after: Duration) -> Self;
}

/// Retry policy for a single logical operation
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first (minimum 1)
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Cap on the backoff delay
    pub max_delay: Duration,
    /// Upper bound on each attempt
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            timeout: Duration::from_secs(config.operation_timeout_secs),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn no_retry(timeout: Duration) -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            timeout,
        }
    }
}

/// Run `op` under `policy`, retrying retryable failures with backoff
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, operation: &str, mut op: F) -> Result<T, E>
where
    E: Retryable,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut delay = policy.initial_delay;
    let mut attempt = 0;

    loop {
        attempt += 1;

        let result = match tokio::time::timeout(policy.timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(E::timed_out(policy.timeout)),
        };

        match result {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                tracing::warn!(
                    operation,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retryable failure, backing off"
                );
                increment_counter(CounterMetric::Retries, 1);

                sleep(delay).await;
                delay = (delay * 2).min(policy.max_delay);
            }
            Err(e) => return Err(e),
        }
    }
}
