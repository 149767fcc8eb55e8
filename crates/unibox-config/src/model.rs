// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Unibox unified inbox.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};
use unibox_core::ChannelType;

/// Top-level Unibox configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UniboxConfig {
    /// Unified inbox settings.
    #[serde(default)]
    pub inbox: InboxConfig,

    /// Related-message gathering settings.
    #[serde(default)]
    pub related: RelatedConfig,

    /// Default circuit breaker settings for every channel client.
    #[serde(default)]
    pub breaker: BreakerConfig,

    /// Key-value storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Email channel settings.
    #[serde(default)]
    pub email: EmailConfig,

    /// Chat channel settings.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Mobile messaging channel settings.
    #[serde(default)]
    pub mobile: MobileConfig,
}

impl UniboxConfig {
    /// The breaker settings for a channel: its own `[<channel>.breaker]`
    /// section when present, otherwise the global `[breaker]` section.
    pub fn breaker_for(&self, channel: ChannelType) -> &BreakerConfig {
        let specific = match channel {
            ChannelType::Email => self.email.breaker.as_ref(),
            ChannelType::Chat => self.chat.breaker.as_ref(),
            ChannelType::Mobile => self.mobile.breaker.as_ref(),
        };
        specific.unwrap_or(&self.breaker)
    }
}

/// Unified inbox configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InboxConfig {
    /// Maximum unread messages requested from each channel per cycle.
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            fetch_limit: default_fetch_limit(),
            log_level: default_log_level(),
        }
    }
}

fn default_fetch_limit() -> usize {
    50
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Related-message gathering configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelatedConfig {
    /// How far back to look for a person's other messages.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Maximum messages fetched from each linked channel.
    #[serde(default = "default_per_channel_limit")]
    pub per_channel_limit: usize,
}

impl Default for RelatedConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            per_channel_limit: default_per_channel_limit(),
        }
    }
}

fn default_lookback_days() -> u32 {
    7
}

fn default_per_channel_limit() -> usize {
    10
}

/// Circuit breaker thresholds.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BreakerConfig {
    /// Per-call timeout in milliseconds; a slower call counts as a failure.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Failure percentage of the rolling window at which the breaker opens.
    #[serde(default = "default_error_threshold_percentage")]
    pub error_threshold_percentage: u8,

    /// Minimum calls in the rolling window before the breaker may open.
    #[serde(default = "default_volume_threshold")]
    pub volume_threshold: u32,

    /// How long an open breaker rejects calls before admitting a probe.
    #[serde(default = "default_reset_timeout_ms")]
    pub reset_timeout_ms: u64,

    /// Length of the rolling statistics window in milliseconds.
    #[serde(default = "default_rolling_window_ms")]
    pub rolling_window_ms: u64,

    /// Number of buckets the rolling window is divided into.
    #[serde(default = "default_rolling_buckets")]
    pub rolling_buckets: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            error_threshold_percentage: default_error_threshold_percentage(),
            volume_threshold: default_volume_threshold(),
            reset_timeout_ms: default_reset_timeout_ms(),
            rolling_window_ms: default_rolling_window_ms(),
            rolling_buckets: default_rolling_buckets(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_error_threshold_percentage() -> u8 {
    50
}

fn default_volume_threshold() -> u32 {
    5
}

fn default_reset_timeout_ms() -> u64 {
    30_000
}

fn default_rolling_window_ms() -> u64 {
    10_000
}

fn default_rolling_buckets() -> u32 {
    10
}

/// Key-value storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database holding mappings, tokens and inbound messages.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journal mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("unibox").join("unibox.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("unibox.db"))
        .display()
        .to_string()
}

fn default_true() -> bool {
    true
}

/// Email channel configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {
    /// Base URL of the mailbox REST API. The client reports itself
    /// unauthenticated until this is set.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Breaker override for this channel.
    #[serde(default)]
    pub breaker: Option<BreakerConfig>,
}

/// Chat channel configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Base URL of the chat server REST API.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Incoming-webhook URL used for sending, when set.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Breaker override for this channel.
    #[serde(default)]
    pub breaker: Option<BreakerConfig>,
}

/// Mobile messaging channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MobileConfig {
    /// Base URL of the messaging Graph API.
    #[serde(default = "default_mobile_base_url")]
    pub base_url: String,

    /// Business phone number id messages are sent from.
    #[serde(default)]
    pub phone_number_id: Option<String>,

    /// Breaker override for this channel.
    #[serde(default)]
    pub breaker: Option<BreakerConfig>,
}

impl Default for MobileConfig {
    fn default() -> Self {
        Self {
            base_url: default_mobile_base_url(),
            phone_number_id: None,
            breaker: None,
        }
    }
}

fn default_mobile_base_url() -> String {
    "https://graph.facebook.com/v19.0".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = UniboxConfig::default();
        assert_eq!(config.inbox.fetch_limit, 50);
        assert_eq!(config.related.lookback_days, 7);
        assert_eq!(config.breaker.volume_threshold, 5);
        assert_eq!(config.breaker.error_threshold_percentage, 50);
        assert!(config.email.base_url.is_none());
        assert!(config.storage.database_path.ends_with("unibox.db"));
    }

    #[test]
    fn channel_breaker_override_wins() {
        let toml_str = r#"
[breaker]
timeout_ms = 2000

[chat.breaker]
timeout_ms = 500
volume_threshold = 2
"#;
        let config: UniboxConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.breaker_for(ChannelType::Email).timeout_ms, 2000);
        assert_eq!(config.breaker_for(ChannelType::Chat).timeout_ms, 500);
        assert_eq!(config.breaker_for(ChannelType::Chat).volume_threshold, 2);
        // Unset override fields fall back to compiled defaults, not [breaker].
        assert_eq!(
            config.breaker_for(ChannelType::Chat).reset_timeout_ms,
            30_000
        );
    }

    #[test]
    fn mobile_has_public_default_base_url() {
        let config: UniboxConfig = toml::from_str("[mobile]\nphone_number_id = \"123\"").unwrap();
        assert!(config.mobile.base_url.starts_with("https://"));
        assert_eq!(config.mobile.phone_number_id.as_deref(), Some("123"));
    }
}
