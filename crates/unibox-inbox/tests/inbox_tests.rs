// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end aggregation over mock channels, real breakers and SQLite.

use std::sync::Arc;
use std::time::Duration;

use unibox_config::model::{InboxConfig, RelatedConfig};
use unibox_core::{
    ChannelClient, ChannelType, CircuitState, KeyValueStore, NewUserMapping, Priority,
};
use unibox_inbox::{
    identities_from, MappingStore, Origin, RelatedMessageGatherer, UnifiedInbox,
    NOT_AUTHENTICATED,
};
use unibox_resilience::{BreakerEvent, CircuitBreaker, CircuitBreakerConfig};
use unibox_storage::SqliteStore;
use unibox_test_utils::fixtures::{base_time, message};
use unibox_test_utils::{MockChannelClient, RecordingObserver};

async fn sqlite_mappings() -> MappingStore {
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    MappingStore::new(store)
}

#[tokio::test]
async fn three_channel_scenario() {
    let mappings = sqlite_mappings().await;
    mappings
        .create(NewUserMapping {
            display_name: "Alice".into(),
            identities: identities_from(Some("alice@co.com".into()), None, None),
            priority: Priority::Urgent,
            tags: vec!["exec".into()],
        })
        .await
        .unwrap();

    let a: Arc<dyn ChannelClient> = Arc::new(
        MockChannelClient::new("A", ChannelType::Email).with_messages(vec![
            message(ChannelType::Email, "a1", "Alice <alice@co.com>", 1),
            message(ChannelType::Email, "a2", "stranger@else.org", 2),
        ]),
    );
    let b: Arc<dyn ChannelClient> =
        Arc::new(MockChannelClient::new("B", ChannelType::Chat).unauthenticated());
    let c: Arc<dyn ChannelClient> = Arc::new(
        MockChannelClient::new("C", ChannelType::Mobile).failing("network error"),
    );

    let inbox = UnifiedInbox::new(vec![a, b, c], mappings, &InboxConfig::default());
    let result = inbox.fetch_all().await;

    assert!(result.success);
    assert_eq!(result.total_count, 2);
    assert_eq!(result.channel_results.len(), 3);

    let a = &result.channel_results["A"];
    assert!(a.success);
    assert_eq!(a.message_count, 2);
    assert!(a.error.is_none());

    let b = &result.channel_results["B"];
    assert!(!b.success);
    assert_eq!(b.message_count, 0);
    assert_eq!(b.error.as_deref(), Some(NOT_AUTHENTICATED));

    let c = &result.channel_results["C"];
    assert!(!c.success);
    assert!(c.error.as_deref().unwrap().contains("network error"));

    let ids: Vec<_> = result.messages.iter().map(|m| m.message.id.as_str()).collect();
    assert_eq!(ids, vec!["a1", "a2"]);
    assert_eq!(result.messages[0].priority, Priority::Urgent);
    assert_eq!(
        result.messages[0].user.as_ref().map(|u| u.display_name.as_str()),
        Some("Alice")
    );
    assert_eq!(result.messages[1].priority, Priority::Normal);
    assert!(!result.all_failed());
}

#[tokio::test]
async fn messages_keep_registration_then_channel_order() {
    let slow: Arc<dyn ChannelClient> = Arc::new(
        MockChannelClient::new("slow", ChannelType::Email)
            .with_messages(vec![
                message(ChannelType::Email, "s2", "x@co.com", 20),
                message(ChannelType::Email, "s1", "x@co.com", 10),
            ])
            .with_delay(Duration::from_millis(50)),
    );
    let fast: Arc<dyn ChannelClient> = Arc::new(
        MockChannelClient::new("fast", ChannelType::Chat)
            .with_messages(vec![message(ChannelType::Chat, "f1", "y", 30)]),
    );

    let inbox = UnifiedInbox::new(
        vec![slow, fast],
        sqlite_mappings().await,
        &InboxConfig::default(),
    );
    let result = inbox.fetch_all().await;

    let ids: Vec<_> = result.messages.iter().map(|m| m.message.id.as_str()).collect();
    assert_eq!(ids, vec!["s2", "s1", "f1"]);
}

#[tokio::test(start_paused = true)]
async fn slow_channels_are_fetched_concurrently() {
    let clients: Vec<Arc<dyn ChannelClient>> = [
        ("email", ChannelType::Email),
        ("chat", ChannelType::Chat),
        ("mobile", ChannelType::Mobile),
    ]
    .into_iter()
    .map(|(name, channel)| {
        let client = MockChannelClient::new(name, channel)
            .with_messages(vec![message(channel, name, "x", 0)])
            .with_delay(Duration::from_millis(500));
        Arc::new(client) as Arc<dyn ChannelClient>
    })
    .collect();
    let inbox = UnifiedInbox::new(
        clients,
        MappingStore::new(Arc::new(unibox_storage::MemoryStore::new())),
        &InboxConfig::default(),
    );

    let start = tokio::time::Instant::now();
    let result = inbox.fetch_all().await;
    let elapsed = tokio::time::Instant::now() - start;

    assert_eq!(result.total_count, 3);
    assert!(elapsed >= Duration::from_millis(500), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(1), "{elapsed:?}");
}

#[tokio::test]
async fn every_mix_of_behaviours_yields_one_result_per_client() {
    for mask in 0u8..27 {
        let mut clients: Vec<Arc<dyn ChannelClient>> = Vec::new();
        let mut m = mask;
        for i in 0..3 {
            let name = format!("c{i}");
            let client = MockChannelClient::new(name, ChannelType::Chat);
            let client = match m % 3 {
                0 => client.with_messages(vec![message(ChannelType::Chat, "x", "u", 0)]),
                1 => client.unauthenticated(),
                _ => client.failing("boom"),
            };
            m /= 3;
            clients.push(Arc::new(client));
        }

        let inbox = UnifiedInbox::new(clients, sqlite_mappings().await, &InboxConfig::default());
        let result = inbox.fetch_all().await;
        assert!(result.success);
        assert_eq!(result.channel_results.len(), 3, "mask {mask}");
        let ok = result.channel_results.values().filter(|r| r.success).count();
        assert_eq!(result.total_count, ok);
    }
}

#[tokio::test(start_paused = true)]
async fn open_breaker_shows_as_failed_channel_without_fetching() {
    let observer = Arc::new(RecordingObserver::new());
    let breaker = CircuitBreaker::with_observer(
        "email",
        CircuitBreakerConfig::default()
            .with_thresholds(2, 50)
            .with_timeout(Duration::from_millis(100)),
        observer.clone(),
    );
    let email = Arc::new(
        MockChannelClient::new("email", ChannelType::Email)
            .with_delay(Duration::from_millis(500))
            .with_breaker(breaker),
    );
    let email_dyn: Arc<dyn ChannelClient> = email.clone();
    let inbox = UnifiedInbox::new(
        vec![email_dyn],
        MappingStore::new(Arc::new(unibox_storage::MemoryStore::new())),
        &InboxConfig::default(),
    );

    for _ in 0..2 {
        let result = inbox.fetch_all().await;
        let email = &result.channel_results["email"];
        assert!(email.error.as_deref().unwrap().contains("timed out"));
    }
    assert_eq!(email.breaker().unwrap().state(), CircuitState::Open);
    assert_eq!(observer.count(BreakerEvent::Timeout), 2);

    let result = inbox.fetch_all().await;
    let channel = &result.channel_results["email"];
    assert!(!channel.success);
    assert!(channel.error.as_deref().unwrap().contains("is open"));
    assert_eq!(email.fetch_count(), 2);

    let snapshots = inbox.breaker_snapshots();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].rejects, 1);
    assert_eq!(snapshots[0].timeouts, 2);
}

#[tokio::test]
async fn related_messages_span_linked_channels() {
    let mappings = sqlite_mappings().await;
    let bob = mappings
        .create(NewUserMapping {
            display_name: "Bob".into(),
            identities: identities_from(
                Some("bob@co.com".into()),
                Some("bob".into()),
                Some("15551234567".into()),
            ),
            priority: Priority::High,
            tags: Vec::new(),
        })
        .await
        .unwrap();

    let clients: Vec<Arc<dyn ChannelClient>> = vec![
        Arc::new(
            MockChannelClient::new("email", ChannelType::Email)
                .with_messages(vec![message(ChannelType::Email, "e1", "bob@co.com", -120)]),
        ),
        Arc::new(
            MockChannelClient::new("chat", ChannelType::Chat)
                .with_messages(vec![message(ChannelType::Chat, "c1", "bob", -30)]),
        ),
        Arc::new(MockChannelClient::new("mobile", ChannelType::Mobile).with_messages(vec![
            message(ChannelType::Mobile, "p1", "15551234567", -1),
            message(ChannelType::Mobile, "p0", "15551234567", -2),
        ])),
    ];

    let gatherer = RelatedMessageGatherer::new(clients, mappings, &RelatedConfig::default());
    let origin = Origin {
        channel: ChannelType::Mobile,
        id: "p1",
    };
    let related = gatherer.related_messages_at(&bob.id, origin, base_time()).await;

    let ids: Vec<_> = related.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["p0", "c1", "e1"]);
}
