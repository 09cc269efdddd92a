//! Deadlines and retry with exponential backoff for capability calls.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use crate::error::CapabilityError;

/// Bounded exponential backoff, applied to transient errors only.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Returns the delay to wait after the given delay, capped at `max_delay`.
    fn next_delay(&self, delay: Duration) -> Duration {
        delay.mul_f64(self.multiplier).min(self.max_delay)
    }
}

/// Runs `operation`, retrying with backoff while it fails transiently.
///
/// Non-transient errors (declines, missing resources, insufficient stock)
/// are returned after the first attempt.
pub async fn retry_on_transient<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &'static str,
    mut operation: F,
) -> Result<T, CapabilityError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CapabilityError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    let mut delay = policy.initial_delay;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(operation = operation_name, attempt, "call succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) if error.is_transient() && attempt < max_attempts => {
                metrics::counter!("capability_transport_errors_total", "operation" => operation_name)
                    .increment(1);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    error = %error,
                    delay_ms = delay.as_millis() as u64,
                    "transient failure, retrying after delay"
                );
                sleep(delay).await;
                delay = policy.next_delay(delay);
            }
            Err(error) => {
                if error.is_transient() {
                    metrics::counter!("capability_transport_errors_total", "operation" => operation_name)
                        .increment(1);
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        error = %error,
                        "call failed after all retries"
                    );
                }
                return Err(error);
            }
        }
    }
}

/// Per-step execution policy: a deadline around the whole step, retries inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct StepPolicy {
    /// Time budget for one step, including all of its retries.
    pub deadline: Duration,
    /// Retry policy for transient failures within the step.
    pub retry: RetryPolicy,
}

impl Default for StepPolicy {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        }
    }
}

impl StepPolicy {
    /// Runs one capability call under this policy.
    ///
    /// Deadline expiry is reported as `CapabilityError::Timeout`, which the
    /// saga handles exactly like any other failed outcome.
    pub async fn call<F, Fut, T>(
        &self,
        operation_name: &'static str,
        operation: F,
    ) -> Result<T, CapabilityError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CapabilityError>>,
    {
        match tokio::time::timeout(
            self.deadline,
            retry_on_transient(&self.retry, operation_name, operation),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                metrics::counter!("capability_deadline_exceeded_total", "operation" => operation_name)
                    .increment(1);
                tracing::warn!(
                    operation = operation_name,
                    deadline_ms = self.deadline.as_millis() as u64,
                    "step deadline exceeded"
                );
                Err(CapabilityError::Timeout(self.deadline))
            }
        }
    }
}
