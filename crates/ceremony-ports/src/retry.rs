//! Bounded exponential backoff for calls to the opaque upstream ports
//! (`BlobStore`, `ComputeProvider`, `ZKeyEngine`).
//!
//! Spec §7: "upstream transients are retried with bounded exponential
//! backoff inside the component that owns them"; §4.H's "Failure modes"
//! makes the same requirement for the verification pipeline specifically.
//! `retry_upstream` is that wrapper — components call it around a single
//! port call, it retries only `CoreError::UpstreamUnavailable` (everything
//! else, including state-machine guard failures, is never retried), and
//! surfaces the last error unchanged once attempts are exhausted.

use crate::error::CoreError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// How many attempts (including the first) to make and how the delay
/// between them grows: `delay(n) = base_delay * 2^n`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
        }
    }
}

/// Runs `op` up to `policy.max_attempts` times. Retries only when the
/// error is `CoreError::is_retryable_by_caller`, sleeping
/// `policy.base_delay * 2^(attempt - 1)` between attempts. `on_retry` is
/// invoked once per retry (before the sleep) so callers can fold a metric
/// in without this crate depending on a metrics crate.
pub async fn retry_upstream<T, F, Fut>(
    policy: RetryPolicy,
    component: &'static str,
    operation: &'static str,
    mut on_retry: impl FnMut(),
    mut op: F,
) -> Result<T, CoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable_by_caller() && attempt < policy.max_attempts => {
                let delay = policy.base_delay * 2u32.pow(attempt - 1);
                warn!(
                    component,
                    operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retrying after transient upstream failure"
                );
                on_retry();
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
