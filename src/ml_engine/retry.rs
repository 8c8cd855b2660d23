//! Bounded retry with exponential backoff for coefficient fetches

use std::time::Duration;

use tracing::warn;

use crate::config::{defaults::MODEL_FETCH_MAX_BACKOFF_EXPONENT, ModelSourceConfig};

use super::source::{CoefficientSource, SourceError};
use super::ModelCoefficients;

/// Retry schedule for one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first try included
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// ±25% random variation on each delay
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ModelSourceConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &ModelSourceConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_backoff_ms),
            max_delay: Duration::from_millis(config.max_backoff_ms),
            jitter: config.jitter,
        }
    }

    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: false,
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(MODEL_FETCH_MAX_BACKOFF_EXPONENT);
        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        let delay_ms = base_ms.saturating_mul(1u64 << exponent).min(max_ms);

        let final_ms = if self.jitter && delay_ms > 0 {
            use rand::Rng;
            let spread = delay_ms / 4;
            rand::thread_rng().gen_range(delay_ms - spread..=delay_ms + spread)
        } else {
            delay_ms
        };
        Duration::from_millis(final_ms)
    }

    /// Upper bound on total sleep across all retries (without jitter).
    pub fn max_total_wait(&self) -> Duration {
        (1..self.max_attempts)
            .map(|retry| {
                let exponent = (retry - 1).min(MODEL_FETCH_MAX_BACKOFF_EXPONENT);
                self.base_delay.saturating_mul(1 << exponent).min(self.max_delay)
            })
            .sum()
    }
}

/// Fetch from `source`, retrying transient failures per `policy`.
///
/// Permanent failures (bad schema, missing file, 4xx) return immediately.
pub async fn fetch_with_retry(
    source: &dyn CoefficientSource,
    policy: &RetryPolicy,
) -> Result<ModelCoefficients, SourceError> {
    let mut attempt = 1;
    loop {
        match source.fetch().await {
            Ok(coefficients) => return Ok(coefficients),
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    source = source.name(),
                    attempt,
                    max_attempts = policy.max_attempts,
                    retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "Coefficient fetch failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
