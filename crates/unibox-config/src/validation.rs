// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use unibox_core::ChannelType;

use crate::diagnostic::ConfigError;
use crate::model::{BreakerConfig, UniboxConfig};

/// Ten years.
pub const MAX_LOOKBACK_DAYS: u32 = 3650;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every violation instead of failing on the first.
pub fn validate_config(config: &UniboxConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.inbox.fetch_limit == 0 {
        errors.push(invalid("inbox.fetch_limit must be at least 1"));
    }

    if !(1..=MAX_LOOKBACK_DAYS).contains(&config.related.lookback_days) {
        errors.push(invalid(format!(
            "related.lookback_days must be between 1 and {MAX_LOOKBACK_DAYS}, got {}",
            config.related.lookback_days
        )));
    }

    if config.related.per_channel_limit == 0 {
        errors.push(invalid("related.per_channel_limit must be at least 1"));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(invalid("storage.database_path must not be empty"));
    }

    validate_breaker("breaker", &config.breaker, &mut errors);
    for channel in [ChannelType::Email, ChannelType::Chat, ChannelType::Mobile] {
        let section = format!("{channel}.breaker");
        let specific = match channel {
            ChannelType::Email => config.email.breaker.as_ref(),
            ChannelType::Chat => config.chat.breaker.as_ref(),
            ChannelType::Mobile => config.mobile.breaker.as_ref(),
        };
        if let Some(breaker) = specific {
            validate_breaker(&section, breaker, &mut errors);
        }
    }

    let urls = [
        ("email.base_url", config.email.base_url.as_deref()),
        ("chat.base_url", config.chat.base_url.as_deref()),
        ("chat.webhook_url", config.chat.webhook_url.as_deref()),
        ("mobile.base_url", Some(config.mobile.base_url.as_str())),
    ];
    for (key, url) in urls {
        if let Some(url) = url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                errors.push(invalid(format!(
                    "{key} `{url}` must start with http:// or https://"
                )));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_breaker(section: &str, breaker: &BreakerConfig, errors: &mut Vec<ConfigError>) {
    if breaker.timeout_ms == 0 {
        errors.push(invalid(format!("{section}.timeout_ms must be at least 1")));
    }
    if !(1..=100).contains(&breaker.error_threshold_percentage) {
        errors.push(invalid(format!(
            "{section}.error_threshold_percentage must be between 1 and 100, got {}",
            breaker.error_threshold_percentage
        )));
    }
    if breaker.reset_timeout_ms == 0 {
        errors.push(invalid(format!(
            "{section}.reset_timeout_ms must be at least 1"
        )));
    }
    if breaker.rolling_buckets == 0 {
        errors.push(invalid(format!(
            "{section}.rolling_buckets must be at least 1"
        )));
    } else if breaker.rolling_window_ms < u64::from(breaker.rolling_buckets) {
        errors.push(invalid(format!(
            "{section}.rolling_window_ms ({}) must be at least rolling_buckets ({})",
            breaker.rolling_window_ms, breaker.rolling_buckets
        )));
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}
