// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cross-channel identity records.
//!
//! A [`UserMapping`] says "these senders on these channels are one person".
//! Each channel stores a differently shaped identity record, and each shape
//! carries its own sender predicate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::ChannelType;

/// Importance assigned to a person, copied onto their resolved messages.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

/// Address-style identity on the email channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailIdentity {
    pub address: String,
}

/// Username and optional opaque user id on the chat channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatIdentity {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Opaque phone id on the mobile channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobileIdentity {
    pub phone: String,
}

/// The per-channel identity dictionary of a mapping. A channel is linked
/// when its entry is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelIdentities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat: Option<ChatIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<MobileIdentity>,
}

/// A borrowed view of one channel's identity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelIdentity<'a> {
    Email(&'a EmailIdentity),
    Chat(&'a ChatIdentity),
    Mobile(&'a MobileIdentity),
}

impl ChannelIdentities {
    /// Returns the identity record for `channel`, if the mapping links it.
    pub fn get(&self, channel: ChannelType) -> Option<ChannelIdentity<'_>> {
        match channel {
            ChannelType::Email => self.email.as_ref().map(ChannelIdentity::Email),
            ChannelType::Chat => self.chat.as_ref().map(ChannelIdentity::Chat),
            ChannelType::Mobile => self.mobile.as_ref().map(ChannelIdentity::Mobile),
        }
    }

    /// Linked channels in a fixed order: email, chat, mobile.
    pub fn linked_channels(&self) -> Vec<ChannelType> {
        [ChannelType::Email, ChannelType::Chat, ChannelType::Mobile]
            .into_iter()
            .filter(|c| self.get(*c).is_some())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.chat.is_none() && self.mobile.is_none()
    }
}

impl ChannelIdentity<'_> {
    pub fn channel(&self) -> ChannelType {
        match self {
            Self::Email(_) => ChannelType::Email,
            Self::Chat(_) => ChannelType::Chat,
            Self::Mobile(_) => ChannelType::Mobile,
        }
    }

    /// Whether a message's `from` field belongs to this identity.
    ///
    /// - email: the stored address appears anywhere in `from`, ignoring
    ///   case, so a `"Name <addr>"` wrapper still matches.
    /// - chat: `from` equals the username or the opaque user id.
    /// - mobile: `from` equals the stored phone id.
    ///
    /// Blank stored values never match.
    pub fn matches_sender(&self, from: &str) -> bool {
        match self {
            Self::Email(id) => {
                let address = id.address.trim();
                !address.is_empty()
                    && from
                        .to_ascii_lowercase()
                        .contains(&address.to_ascii_lowercase())
            }
            Self::Chat(id) => {
                let username = id.username.trim();
                (!username.is_empty() && from == username)
                    || id
                        .user_id
                        .as_deref()
                        .map(str::trim)
                        .is_some_and(|uid| !uid.is_empty() && from == uid)
            }
            Self::Mobile(id) => {
                let phone = id.phone.trim();
                !phone.is_empty() && from == phone
            }
        }
    }
}

/// A persisted "these senders are one person" record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMapping {
    pub id: String,
    pub display_name: String,
    pub identities: ChannelIdentities,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserMapping {
    /// Whether `from` on `channel` belongs to this person.
    pub fn matches(&self, channel: ChannelType, from: &str) -> bool {
        self.identities
            .get(channel)
            .is_some_and(|identity| identity.matches_sender(from))
    }
}

/// Input for creating a mapping; the store assigns id and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUserMapping {
    pub display_name: String,
    pub identities: ChannelIdentities,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(address: &str) -> ChannelIdentities {
        ChannelIdentities {
            email: Some(EmailIdentity {
                address: address.into(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn email_matches_display_name_wrapper() {
        let ids = email("alice@co.com");
        let identity = ids.get(ChannelType::Email).unwrap();
        assert!(identity.matches_sender("Alice <alice@co.com>"));
        assert!(identity.matches_sender("alice@co.com"));
        assert!(identity.matches_sender("ALICE@CO.COM"));
        assert!(!identity.matches_sender("bob@co.com"));
    }

    #[test]
    fn blank_email_never_matches() {
        let ids = email("  ");
        assert!(!ids.get(ChannelType::Email).unwrap().matches_sender("anyone@x.io"));
    }

    #[test]
    fn chat_matches_username_or_user_id_exactly() {
        let ids = ChannelIdentities {
            chat: Some(ChatIdentity {
                username: "alice".into(),
                user_id: Some("U123".into()),
            }),
            ..Default::default()
        };
        let identity = ids.get(ChannelType::Chat).unwrap();
        assert!(identity.matches_sender("alice"));
        assert!(identity.matches_sender("U123"));
        assert!(!identity.matches_sender("alice2"));
        assert!(!identity.matches_sender("Alice"));
    }

    #[test]
    fn mobile_requires_exact_phone() {
        let ids = ChannelIdentities {
            mobile: Some(MobileIdentity {
                phone: "15551234567".into(),
            }),
            ..Default::default()
        };
        let identity = ids.get(ChannelType::Mobile).unwrap();
        assert!(identity.matches_sender("15551234567"));
        assert!(!identity.matches_sender("+15551234567"));
    }

    #[test]
    fn missing_channel_record_is_no_match() {
        let ids = email("alice@co.com");
        assert!(ids.get(ChannelType::Chat).is_none());
        assert_eq!(ids.linked_channels(), vec![ChannelType::Email]);
    }

    #[test]
    fn priority_defaults_to_normal() {
        assert_eq!(Priority::default(), Priority::Normal);
        let parsed: Priority = serde_json::from_str("\"urgent\"").unwrap();
        assert_eq!(parsed, Priority::Urgent);
    }

    #[test]
    fn mapping_json_shape_keys_identities_by_channel() {
        let json = serde_json::json!({
            "id": "u1",
            "display_name": "Alice",
            "identities": {
                "email": {"address": "alice@co.com"},
                "mobile": {"phone": "15550001111"}
            },
            "priority": "high",
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        });
        let mapping: UserMapping = serde_json::from_value(json).unwrap();
        assert_eq!(mapping.priority, Priority::High);
        assert!(mapping.tags.is_empty());
        assert!(mapping.matches(ChannelType::Mobile, "15550001111"));
        assert!(!mapping.matches(ChannelType::Chat, "alice"));
    }
}
