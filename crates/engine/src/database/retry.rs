//! Backoff for `Database::transaction_with_retry`
//!
//! The locking engine itself never retries. A retry re-runs the whole
//! load-mutate-commit cycle from a fresh snapshot, after a pause that doubles
//! with every rejected attempt up to a ceiling.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use versionless_core::{Error, Result};

/// How often and how patiently a rejected transaction is re-run
///
/// Read from the `[retry]` section of `versionless.toml`; missing keys take
/// their defaults (3 retries, 10 ms doubling to at most 100 ms).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Re-runs after the first attempt; 0 disables retrying
    pub max_retries: u32,
    /// Pause before the first re-run, in milliseconds
    pub base_delay_ms: u64,
    /// Ceiling for any single pause, in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 10,
            max_delay_ms: 100,
        }
    }
}

impl RetryConfig {
    /// Default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// A single attempt, never re-run
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Reject settings whose first pause already exceeds the ceiling
    ///
    /// # Errors
    /// `Error::Config` naming both values.
    pub fn validate(&self) -> Result<()> {
        if self.base_delay_ms > self.max_delay_ms {
            return Err(Error::config(format!(
                "retry.base_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                self.base_delay_ms, self.max_delay_ms
            )));
        }
        Ok(())
    }

    /// True if another run is allowed after `rejected` rejected attempts
    pub(crate) fn allows_retry(&self, rejected: u32) -> bool {
        rejected <= self.max_retries
    }

    /// Pause after the `rejected`-th rejected attempt (1-based)
    pub(crate) fn backoff(&self, rejected: u32) -> Duration {
        let doublings = rejected.saturating_sub(1);
        let factor = 1u64.checked_shl(doublings).unwrap_or(u64::MAX);
        let ms = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(ms)
    }
}
