// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence for Unibox.
//!
//! Everything Unibox stores (auth tokens, user mappings, buffered webhook
//! payloads) is a JSON value under a string key.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Storage key of the token for `channel`.
pub fn auth_token_key(channel: unibox_core::ChannelType) -> String {
    format!("auth_token:{channel}")
}

/// Storage key of buffered inbound webhook messages for `channel`.
pub fn inbound_key(channel: unibox_core::ChannelType) -> String {
    format!("inbound:{channel}")
}
