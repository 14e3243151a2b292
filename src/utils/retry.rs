//! Retry policy for upstream fetches
//!
//! Exponential backoff with an optional additive jitter. The policy only
//! computes delays; deciding what is retryable belongs to the fetcher.

use rand::{Rng, rng};
use std::time::Duration;

use crate::config::ScraperConfig;

/// Configuration for fetch retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay (before jitter)
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Additive jitter, as a percentage of the computed delay
    pub jitter_percent: u8,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&ScraperConfig::default())
    }
}

impl From<&ScraperConfig> for RetryConfig {
    fn from(config: &ScraperConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: config.retry_base_delay,
            max_delay: config.retry_max_delay,
            backoff_multiplier: 2.0,
            jitter_percent: config.retry_jitter_percent,
        }
    }
}

impl RetryConfig {
    /// No retries at all; used for probes
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Total number of attempts including the first one
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay to wait after the given failed attempt (1-based)
    ///
    /// Saturates at `u64::MAX` milliseconds instead of overflowing.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let exponential = self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        // float to int casts saturate
        let delay_ms = exponential.min(self.max_delay.as_millis() as f64) as u64;

        Duration::from_millis(delay_ms.saturating_add(jitter_ms(delay_ms, self.jitter_percent)))
    }
}

/// Random jitter between 0 and `percent`% of `base_ms` (inclusive)
fn jitter_ms(base_ms: u64, percent: u8) -> u64 {
    if percent == 0 || base_ms == 0 {
        return 0;
    }
    let max_jitter = (u128::from(base_ms) * u128::from(percent) / 100).min(u128::from(u64::MAX)) as u64;
    rng().random_range(0..=max_jitter)
}
