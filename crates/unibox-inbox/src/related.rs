// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recent cross-channel history with one person, used as reply context.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use tracing::{debug, warn};

use unibox_config::model::RelatedConfig;
use unibox_core::{ChannelClient, ChannelType, GetMessagesOptions, Message, UserMapping};

use crate::mappings::MappingStore;

/// The message a reply is being prepared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin<'a> {
    pub channel: ChannelType,
    pub id: &'a str,
}

impl<'a> From<&'a Message> for Origin<'a> {
    fn from(message: &'a Message) -> Self {
        Self {
            channel: message.channel,
            id: &message.id,
        }
    }
}

pub struct RelatedMessageGatherer {
    clients: Vec<Arc<dyn ChannelClient>>,
    mappings: MappingStore,
    lookback: Duration,
    per_channel_limit: usize,
}

impl RelatedMessageGatherer {
    pub fn new(
        clients: Vec<Arc<dyn ChannelClient>>,
        mappings: MappingStore,
        config: &RelatedConfig,
    ) -> Self {
        Self {
            clients,
            mappings,
            lookback: Duration::try_days(i64::from(config.lookback_days))
                .unwrap_or(Duration::MAX),
            per_channel_limit: config.per_channel_limit,
        }
    }

    /// Messages from `user_id` on every linked channel within the lookback
    /// window, newest first, excluding `origin` itself.
    ///
    /// Unknown users and lookup failures yield an empty list.
    pub async fn related_messages(&self, user_id: &str, origin: Origin<'_>) -> Vec<Message> {
        self.related_messages_at(user_id, origin, Utc::now()).await
    }

    pub async fn related_messages_at(
        &self,
        user_id: &str,
        origin: Origin<'_>,
        now: DateTime<Utc>,
    ) -> Vec<Message> {
        let mapping = match self.mappings.get(user_id).await {
            Ok(Some(mapping)) => mapping,
            Ok(None) => {
                debug!(user_id, "no mapping for user, no related messages");
                return Vec::new();
            }
            Err(e) => {
                warn!(user_id, error = %e, "failed to load user mapping");
                return Vec::new();
            }
        };

        let since = now
            .checked_sub_signed(self.lookback)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let fetches = mapping
            .identities
            .linked_channels()
            .into_iter()
            .filter_map(|channel| self.client(channel).map(|client| (channel, client)))
            .map(|(channel, client)| self.fetch_from(client, channel, &mapping, since, now));

        let mut related: Vec<Message> = join_all(fetches)
            .await
            .into_iter()
            .flatten()
            .filter(|m| !(m.channel == origin.channel && m.id == origin.id))
            .collect();
        related.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        debug!(user_id, count = related.len(), "related messages gathered");
        related
    }

    fn client(&self, channel: ChannelType) -> Option<&Arc<dyn ChannelClient>> {
        self.clients.iter().find(|c| c.channel_type() == channel)
    }

    async fn fetch_from(
        &self,
        client: &Arc<dyn ChannelClient>,
        channel: ChannelType,
        mapping: &UserMapping,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Vec<Message> {
        if !client.is_authenticated().await {
            debug!(%channel, "skipping unauthenticated channel for related messages");
            return Vec::new();
        }

        let options = GetMessagesOptions::recent(self.per_channel_limit, since);
        match client.get_messages(options).await {
            Ok(messages) => messages
                .into_iter()
                .filter(|m| m.timestamp >= since && m.timestamp <= now)
                .filter(|m| mapping.matches(channel, &m.from))
                .collect(),
            Err(e) => {
                warn!(%channel, error = %e, "related message fetch failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unibox_core::{KeyValueStore, NewUserMapping, Priority};
    use unibox_storage::MemoryStore;
    use unibox_test_utils::fixtures::{base_time, message};
    use unibox_test_utils::MockChannelClient;

    use crate::mappings::identities_from;

    async fn setup(
        clients: Vec<Arc<dyn ChannelClient>>,
    ) -> (RelatedMessageGatherer, String) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mappings = MappingStore::new(store);
        let alice = mappings
            .create(NewUserMapping {
                display_name: "Alice".into(),
                identities: identities_from(
                    Some("alice@co.com".into()),
                    Some("alice".into()),
                    None,
                ),
                priority: Priority::High,
                tags: Vec::new(),
            })
            .await
            .unwrap();
        let gatherer = RelatedMessageGatherer::new(clients, mappings, &RelatedConfig::default());
        (gatherer, alice.id)
    }

    #[tokio::test]
    async fn unknown_user_yields_nothing() {
        let (gatherer, _) = setup(Vec::new()).await;
        let origin = message(ChannelType::Email, "m0", "alice@co.com", 0);
        assert!(gatherer.related_messages("nobody", (&origin).into()).await.is_empty());
    }

    #[tokio::test]
    async fn gathers_matching_recent_messages_newest_first() {
        let now = base_time();
        let email: Arc<dyn ChannelClient> = Arc::new(
            MockChannelClient::new("email", ChannelType::Email).with_messages(vec![
                message(ChannelType::Email, "origin", "Alice <alice@co.com>", -5),
                message(ChannelType::Email, "e1", "Alice <alice@co.com>", -60),
                message(ChannelType::Email, "e2", "bob@co.com", -30),
                // Outside the default 7 day window.
                message(ChannelType::Email, "e3", "alice@co.com", -60 * 24 * 8),
            ]),
        );
        let chat: Arc<dyn ChannelClient> = Arc::new(
            MockChannelClient::new("chat", ChannelType::Chat)
                .with_messages(vec![message(ChannelType::Chat, "c1", "alice", -10)]),
        );
        // Alice has no mobile identity, so this is never queried.
        let mobile = Arc::new(
            MockChannelClient::new("mobile", ChannelType::Mobile)
                .with_messages(vec![message(ChannelType::Mobile, "p1", "alice", -1)]),
        );
        let mobile_dyn: Arc<dyn ChannelClient> = mobile.clone();

        let (gatherer, alice) = setup(vec![email, chat, mobile_dyn]).await;
        let origin = Origin {
            channel: ChannelType::Email,
            id: "origin",
        };
        let related = gatherer.related_messages_at(&alice, origin, now).await;

        let ids: Vec<_> = related.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "e1"]);
        assert_eq!(mobile.fetch_count(), 0);
    }

    #[tokio::test]
    async fn uses_recent_options_with_per_channel_limit() {
        let now = base_time();
        let email = Arc::new(MockChannelClient::new("email", ChannelType::Email));
        let email_dyn: Arc<dyn ChannelClient> = email.clone();
        let (gatherer, alice) = setup(vec![email_dyn]).await;

        let origin = message(ChannelType::Email, "m0", "alice@co.com", 0);
        gatherer
            .related_messages_at(&alice, (&origin).into(), now)
            .await;

        let requests = email.requests().await;
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].unread_only);
        assert_eq!(requests[0].limit, 10);
        assert_eq!(requests[0].since, Some(now - Duration::days(7)));
    }

    #[tokio::test]
    async fn oversized_lookback_reaches_back_to_the_earliest_instant() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mappings = MappingStore::new(store);
        let alice = mappings
            .create(NewUserMapping {
                display_name: "Alice".into(),
                identities: identities_from(None, Some("alice".into()), None),
                priority: Priority::Normal,
                tags: Vec::new(),
            })
            .await
            .unwrap();
        let chat = Arc::new(MockChannelClient::new("chat", ChannelType::Chat).with_messages(
            vec![message(ChannelType::Chat, "old", "alice", -60 * 24 * 365 * 20)],
        ));
        let chat_dyn: Arc<dyn ChannelClient> = chat.clone();
        let config = RelatedConfig {
            lookback_days: 4_000_000_000,
            ..RelatedConfig::default()
        };
        let gatherer = RelatedMessageGatherer::new(vec![chat_dyn], mappings, &config);

        let origin = message(ChannelType::Chat, "c0", "alice", 0);
        let related = gatherer
            .related_messages_at(&alice.id, (&origin).into(), base_time())
            .await;

        assert_eq!(related.len(), 1);
        assert_eq!(chat.requests().await[0].since, Some(DateTime::<Utc>::MIN_UTC));
    }

    #[tokio::test]
    async fn failing_and_unauthenticated_channels_are_skipped() {
        let email: Arc<dyn ChannelClient> =
            Arc::new(MockChannelClient::new("email", ChannelType::Email).failing("timeout"));
        let chat = Arc::new(
            MockChannelClient::new("chat", ChannelType::Chat)
                .with_messages(vec![message(ChannelType::Chat, "c1", "alice", -1)])
                .unauthenticated(),
        );
        let chat_dyn: Arc<dyn ChannelClient> = chat.clone();
        let (gatherer, alice) = setup(vec![email, chat_dyn]).await;

        let origin = message(ChannelType::Chat, "c0", "alice", 0);
        let related = gatherer
            .related_messages_at(&alice, (&origin).into(), base_time())
            .await;
        assert!(related.is_empty());
        assert_eq!(chat.fetch_count(), 0);
    }
}
