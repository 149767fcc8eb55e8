// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message model shared by every channel client and the inbox services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Identifies which backend a message came from or a client talks to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    /// Email-style mailbox API.
    Email,
    /// Chat-server API (rooms, usernames).
    Chat,
    /// Mobile messaging API (phone-number identities, webhook delivery).
    Mobile,
}

/// Identifier assigned by an upstream to a sent message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// A message fetched from a channel. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel: ChannelType,
    /// Sender as the upstream reports it (`"Alice <alice@co.com>"`, a
    /// username, a phone id).
    pub from: String,
    pub to: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub is_unread: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
}

/// Options for [`ChannelClient::get_messages`](crate::ChannelClient::get_messages).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetMessagesOptions {
    pub unread_only: bool,
    pub limit: usize,
    /// Only messages at or after this instant, when set.
    pub since: Option<DateTime<Utc>>,
}

impl GetMessagesOptions {
    /// Unread messages, capped at `limit`.
    pub fn unread(limit: usize) -> Self {
        Self {
            unread_only: true,
            limit,
            since: None,
        }
    }

    /// Read and unread messages newer than `since`, capped at `limit`.
    pub fn recent(limit: usize, since: DateTime<Utc>) -> Self {
        Self {
            unread_only: false,
            limit,
            since: Some(since),
        }
    }

    /// Applies these options to an already-fetched list, for upstreams
    /// that cannot filter server-side.
    pub fn apply(&self, messages: Vec<Message>) -> Vec<Message> {
        messages
            .into_iter()
            .filter(|m| !self.unread_only || m.is_unread)
            .filter(|m| self.since.is_none_or(|since| m.timestamp >= since))
            .take(self.limit)
            .collect()
    }
}

/// Parameters for [`ChannelClient::send_message`](crate::ChannelClient::send_message).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageParams {
    pub to: String,
    pub content: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub reply_to_id: Option<String>,
}

impl SendMessageParams {
    pub fn new(to: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            content: content.into(),
            subject: None,
            thread_id: None,
            reply_to_id: None,
        }
    }
}

/// Confirmation that an upstream accepted an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    pub id: MessageId,
    pub channel: ChannelType,
    pub sent_at: DateTime<Utc>,
}
