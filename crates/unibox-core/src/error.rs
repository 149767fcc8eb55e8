// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Unibox workspace.

use std::time::Duration;

use thiserror::Error;

use crate::types::ChannelType;

/// The primary error type used across channel clients, the circuit breaker,
/// storage, and the inbox services.
#[derive(Debug, Error)]
pub enum UniboxError {
    /// Configuration errors (invalid TOML, missing credentials, bad URLs).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An upstream API call failed (network error or non-2xx status).
    #[error("{channel} upstream error: {message}")]
    Upstream {
        channel: ChannelType,
        message: String,
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The circuit breaker guarding an upstream is open; the call was never attempted.
    #[error("circuit breaker `{name}` is open")]
    BreakerOpen { name: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// The channel client has no credentials to talk to its upstream.
    #[error("{channel} client is not authenticated")]
    NotAuthenticated { channel: ChannelType },

    /// Caller-supplied data was rejected.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl UniboxError {
    /// Builds an [`UniboxError::Upstream`] without a status or source.
    pub fn upstream(channel: ChannelType, message: impl Into<String>) -> Self {
        Self::Upstream {
            channel,
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// True when the error is a synthetic breaker rejection rather than a
    /// real upstream failure. Callers use this to show "temporarily
    /// unavailable" instead of an API error.
    pub fn is_breaker_open(&self) -> bool {
        matches!(self, Self::BreakerOpen { .. })
    }

    /// True for failures the circuit breaker counts against an upstream.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Upstream { .. } | Self::Timeout { .. })
    }
}
