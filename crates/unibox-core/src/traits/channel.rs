// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel client trait for messaging backends (email, chat, mobile).

use async_trait::async_trait;

use crate::breaker::BreakerSnapshot;
use crate::error::UniboxError;
use crate::types::{ChannelType, GetMessagesOptions, Message, SendMessageParams, SendReceipt};

/// Capability set of one messaging backend.
///
/// Implementations that call a remote upstream own a private circuit
/// breaker and route those calls through it.
#[async_trait]
pub trait ChannelClient: Send + Sync + 'static {
    /// Human-readable, unique name of this client instance.
    fn name(&self) -> &str;

    /// The backend this client talks to.
    fn channel_type(&self) -> ChannelType;

    /// Whether the client holds credentials for its upstream.
    ///
    /// An unauthenticated client is an expected state, not an error.
    async fn is_authenticated(&self) -> bool;

    /// Fetches messages matching `options`, in the upstream's order.
    async fn get_messages(&self, options: GetMessagesOptions) -> Result<Vec<Message>, UniboxError>;

    /// Sends a message through the upstream.
    async fn send_message(&self, params: SendMessageParams) -> Result<SendReceipt, UniboxError>;

    /// State of the client's circuit breaker, if it has one.
    fn breaker_snapshot(&self) -> Option<BreakerSnapshot> {
        None
    }
}
