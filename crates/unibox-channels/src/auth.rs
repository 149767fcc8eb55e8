// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-channel access tokens persisted in the key-value store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use unibox_core::{ChannelType, KeyValueStore, KeyValueStoreExt, UniboxError};
use unibox_storage::auth_token_key;

/// Bearer credentials for one upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthToken {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.trim().is_empty() && self.expires_at.is_none_or(|exp| exp > now)
    }
}

/// Reads and writes tokens under `auth_token:<channel>`.
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, channel: ChannelType) -> Result<Option<AuthToken>, UniboxError> {
        self.store.get(&auth_token_key(channel)).await
    }

    pub async fn set(&self, channel: ChannelType, token: &AuthToken) -> Result<(), UniboxError> {
        self.store.save(&auth_token_key(channel), token).await?;
        debug!(%channel, "auth token stored");
        Ok(())
    }

    /// The token for `channel` when one is stored and not expired.
    ///
    /// Storage errors are treated as "no token" so that authentication
    /// checks never fail.
    pub async fn usable(&self, channel: ChannelType) -> Option<AuthToken> {
        match self.get(channel).await {
            Ok(Some(token)) if token.is_usable(Utc::now()) => Some(token),
            Ok(_) => None,
            Err(e) => {
                debug!(%channel, error = %e, "token lookup failed");
                None
            }
        }
    }

    /// Like [`usable`](Self::usable) but an error when absent.
    pub async fn require(&self, channel: ChannelType) -> Result<AuthToken, UniboxError> {
        self.usable(channel)
            .await
            .ok_or(UniboxError::NotAuthenticated { channel })
    }
}
