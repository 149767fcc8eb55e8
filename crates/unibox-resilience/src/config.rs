// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime breaker settings, converted from the TOML `[breaker]` section.

use std::time::Duration;

use unibox_config::model::BreakerConfig;

/// Thresholds and timings for one [`CircuitBreaker`](crate::CircuitBreaker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Per-call timeout; a slower call is a failure.
    pub timeout: Duration,
    /// Failure percentage (0-100) of the window that opens the breaker.
    pub error_threshold_percentage: u8,
    /// Minimum calls in the window before the breaker may open.
    pub volume_threshold: u32,
    /// Time an open breaker waits before admitting a probe.
    pub reset_timeout: Duration,
    /// Length of the rolling statistics window.
    pub rolling_window: Duration,
    /// Buckets the window is split into.
    pub rolling_buckets: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self::from(&BreakerConfig::default())
    }
}

impl From<&BreakerConfig> for CircuitBreakerConfig {
    fn from(config: &BreakerConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.timeout_ms),
            error_threshold_percentage: config.error_threshold_percentage.min(100),
            volume_threshold: config.volume_threshold,
            reset_timeout: Duration::from_millis(config.reset_timeout_ms),
            rolling_window: Duration::from_millis(config.rolling_window_ms.max(1)),
            rolling_buckets: config.rolling_buckets.max(1),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_reset_timeout(mut self, reset_timeout: Duration) -> Self {
        self.reset_timeout = reset_timeout;
        self
    }

    pub fn with_thresholds(mut self, volume: u32, error_percentage: u8) -> Self {
        self.volume_threshold = volume;
        self.error_threshold_percentage = error_percentage.min(100);
        self
    }

    /// Duration covered by a single window bucket.
    pub(crate) fn bucket_len(&self) -> Duration {
        (self.rolling_window / self.rolling_buckets).max(Duration::from_millis(1))
    }
}
