// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concrete [`ChannelClient`] implementations.
//!
//! Each client owns a private [`CircuitBreaker`](unibox_resilience::CircuitBreaker)
//! built from the global `[breaker]` section or its channel override.

pub mod auth;
pub mod chat;
pub mod email;
mod http;
pub mod mobile;

use std::sync::Arc;

use unibox_config::UniboxConfig;
use unibox_core::{ChannelClient, ChannelType, KeyValueStore, UniboxError};
use unibox_resilience::CircuitBreakerConfig;

pub use auth::{AuthToken, TokenStore};
pub use chat::ChatClient;
pub use email::EmailClient;
pub use mobile::{MobileClient, MobileInbox};

/// Build one client per channel, in registration order email, chat, mobile.
pub fn build_clients(
    config: &UniboxConfig,
    store: Arc<dyn KeyValueStore>,
) -> Result<Vec<Arc<dyn ChannelClient>>, UniboxError> {
    let tokens = TokenStore::new(store.clone());
    let breaker = |channel| CircuitBreakerConfig::from(config.breaker_for(channel));

    let email = EmailClient::new(&config.email, breaker(ChannelType::Email), tokens.clone())?;
    let chat = ChatClient::new(&config.chat, breaker(ChannelType::Chat), tokens.clone())?;
    let mobile = MobileClient::new(
        &config.mobile,
        breaker(ChannelType::Mobile),
        tokens,
        MobileInbox::new(store),
    )?;

    let clients: Vec<Arc<dyn ChannelClient>> =
        vec![Arc::new(email), Arc::new(chat), Arc::new(mobile)];
    Ok(clients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use unibox_config::model::BreakerConfig;
    use unibox_storage::MemoryStore;

    #[test]
    fn builds_clients_in_registration_order_with_overrides() {
        let mut config = UniboxConfig::default();
        config.chat.breaker = Some(BreakerConfig {
            timeout_ms: 250,
            ..BreakerConfig::default()
        });

        let clients = build_clients(&config, Arc::new(MemoryStore::new())).unwrap();
        let names: Vec<_> = clients.iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["email", "chat", "mobile"]);
        assert_eq!(
            clients.iter().map(|c| c.channel_type()).collect::<Vec<_>>(),
            vec![ChannelType::Email, ChannelType::Chat, ChannelType::Mobile]
        );

        let chat = clients[1].breaker_snapshot().unwrap();
        assert_eq!(chat.name, "chat");
    }
}
