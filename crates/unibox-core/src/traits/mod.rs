// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits: channel clients and key-value storage.
//!
//! Both use `#[async_trait]` for dynamic dispatch compatibility.

pub mod channel;
pub mod storage;

pub use channel::ChannelClient;
pub use storage::{KeyValueStore, KeyValueStoreExt};
