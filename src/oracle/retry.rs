use std::time::Duration;

use rand::Rng;
use tracing::warn;

use super::client::{OracleError, OracleRequest, ReasoningOracle};

/// Bounded retry for transient oracle failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(500),
            max_jitter: Duration::from_millis(250),
        }
    }

    /// No retries at all
    pub fn none() -> Self {
        Self::new(0)
    }

    /// Exponential backoff for the given (1-based) retry, plus random jitter
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponential = self.base_delay * 2_u32.saturating_pow(attempt.saturating_sub(1));
        exponential + self.jitter()
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=max_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(crate::models::settings::DEFAULT_MAX_RETRIES)
    }
}

/// Call the oracle, retrying transient errors up to `policy.max_retries` times.
///
/// The caller's deadline wraps this whole call, so retries never extend it.
pub async fn complete_with_retry(
    oracle: &dyn ReasoningOracle,
    request: &OracleRequest,
    policy: RetryPolicy,
) -> Result<String, OracleError> {
    let mut attempt = 0;

    loop {
        match oracle.complete(request.clone()).await {
            Ok(text) => return Ok(text),
            Err(e) => {
                attempt += 1;

                if !e.is_transient() || attempt > policy.max_retries {
                    return Err(e);
                }

                let delay = policy.backoff(attempt);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient oracle error, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
