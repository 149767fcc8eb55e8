// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attach known people to raw messages.

use serde::Serialize;

use unibox_core::{Message, Priority, UserMapping};

/// A message with the person it was resolved to, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedMessage {
    #[serde(flatten)]
    pub message: Message,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserMapping>,
    pub priority: Priority,
}

impl ResolvedMessage {
    pub fn is_resolved(&self) -> bool {
        self.user.is_some()
    }
}

/// The first mapping, in stored order, whose identity for the message's
/// channel matches its sender.
pub fn find_mapping<'a>(mappings: &'a [UserMapping], message: &Message) -> Option<&'a UserMapping> {
    mappings
        .iter()
        .find(|mapping| mapping.matches(message.channel, &message.from))
}

/// Resolve every message against `mappings`.
///
/// Pure and order preserving. Unmatched messages get `Priority::Normal`.
///
/// Email addresses match case-insensitively: `Alice@Co.com` in `from`
/// matches a stored `alice@co.com`.
pub fn resolve(mappings: &[UserMapping], messages: Vec<Message>) -> Vec<ResolvedMessage> {
    messages
        .into_iter()
        .map(|message| {
            let user = find_mapping(mappings, &message).cloned();
            let priority = user.as_ref().map(|u| u.priority).unwrap_or_default();
            ResolvedMessage {
                message,
                user,
                priority,
            }
        })
        .collect()
}
