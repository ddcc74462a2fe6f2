use crate::config::CalendarConfig;
use crate::error::{CollectorError, ErrorClass, ProviderError, Result};
use metrics::counter;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry(Duration),
    GiveUp,
}

/// Bounded exponential backoff for calendar calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: crate::constants::DEFAULT_MAX_ATTEMPTS,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl From<&CalendarConfig> for RetryPolicy {
    fn from(config: &CalendarConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_unit: Duration::from_millis(config.backoff_unit_ms),
        }
    }
}

impl RetryPolicy {
    /// Wait after failed attempt `attempt` (0-based): unit * (2^attempt + 1).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt).saturating_add(1);
        self.backoff_unit.saturating_mul(factor)
    }

    pub fn decide(&self, attempt: u32, err: &ProviderError) -> RetryDecision {
        match err.class() {
            ErrorClass::NotFound | ErrorClass::Permanent => RetryDecision::GiveUp,
            ErrorClass::Retryable | ErrorClass::Other if attempt + 1 < self.max_attempts => {
                RetryDecision::Retry(self.delay_for(attempt))
            }
            ErrorClass::Retryable | ErrorClass::Other => RetryDecision::GiveUp,
        }
    }

    /// Runs `call` until it succeeds, fails permanently or the attempts run out.
    ///
    /// Not-found maps to `CollectorError::NotFound(target)` without a retry. The
    /// backoff wait and the call itself both yield to `cancel`.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &str,
        target: &str,
        cancel: &CancellationToken,
        mut call: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, ProviderError>>,
    {
        let mut attempt = 0;
        loop {
            counter!("schedule_feed_calendar_attempts_total", "operation" => operation.to_string()).increment(1);
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CollectorError::Cancelled),
                outcome = call() => outcome,
            };

            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if err.class() == ErrorClass::NotFound {
                debug!("{} on {}: not found", operation, target);
                return Err(CollectorError::NotFound(target.to_string()));
            }

            match self.decide(attempt, &err) {
                RetryDecision::Retry(wait) => {
                    warn!(
                        "{} attempt {}/{} failed: {}; retrying in {:?}",
                        operation,
                        attempt + 1,
                        self.max_attempts,
                        err,
                        wait
                    );
                    counter!("schedule_feed_calendar_retries_total", "operation" => operation.to_string())
                        .increment(1);
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(CollectorError::Cancelled),
                        _ = tokio::time::sleep(wait) => {}
                    }
                    attempt += 1;
                }
                RetryDecision::GiveUp => {
                    warn!("{} failed after {} attempt(s): {}", operation, attempt + 1, err);
                    return Err(CollectorError::provider(operation, err));
                }
            }
        }
    }
}
