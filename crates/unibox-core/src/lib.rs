// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Unibox unified inbox.
//!
//! This crate provides the message and identity model, the error type, and
//! the collaborator traits (channel clients, key-value storage) used
//! throughout the Unibox workspace.

pub mod breaker;
pub mod error;
pub mod identity;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use breaker::{BreakerSnapshot, CircuitState};
pub use error::UniboxError;
pub use identity::{
    ChannelIdentities, ChannelIdentity, ChatIdentity, EmailIdentity, MobileIdentity,
    NewUserMapping, Priority, UserMapping,
};
pub use traits::{ChannelClient, KeyValueStore, KeyValueStoreExt};
pub use types::{
    ChannelType, GetMessagesOptions, Message, MessageId, SendMessageParams, SendReceipt,
};
