// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./unibox.toml` > `~/.config/unibox/unibox.toml` > `/etc/unibox/unibox.toml`
//! with environment variable overrides via `UNIBOX_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::UniboxConfig;

/// Top-level sections, in the order env keys are matched against them.
const SECTIONS: &[&str] = &[
    "inbox", "related", "breaker", "storage", "email", "chat", "mobile",
];

/// Channel sections that may carry a nested `breaker` table.
const CHANNEL_SECTIONS: &[&str] = &["email", "chat", "mobile"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/unibox/unibox.toml` (system-wide)
/// 3. `~/.config/unibox/unibox.toml` (user XDG config)
/// 4. `./unibox.toml` (local directory)
/// 5. `UNIBOX_*` environment variables
pub fn load_config() -> Result<UniboxConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<UniboxConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(UniboxConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<UniboxConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(UniboxConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for XDG config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(UniboxConfig::default()))
        .merge(Toml::file("/etc/unibox/unibox.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("unibox/unibox.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("unibox.toml"))
        .merge(env_provider())
}

/// Environment provider mapping `UNIBOX_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names
/// contain underscores: `UNIBOX_INBOX_FETCH_LIMIT` must become
/// `inbox.fetch_limit`, not `inbox.fetch.limit`.
fn env_provider() -> Env {
    Env::prefixed("UNIBOX_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env key to a dotted config path.
///
/// `chat_breaker_timeout_ms` becomes `chat.breaker.timeout_ms`.
pub fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        else {
            continue;
        };
        if CHANNEL_SECTIONS.contains(section) {
            if let Some(field) = rest.strip_prefix("breaker_") {
                return format!("{section}.breaker.{field}");
            }
        }
        return format!("{section}.{rest}");
    }
    key.to_string()
}
