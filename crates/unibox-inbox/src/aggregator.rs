// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fan-out/fan-in over every registered channel client.
//!
//! Each client is queried in its own spawned task. Failures, including
//! panics, stay inside that channel's [`ChannelResult`]; nothing escapes
//! [`UnifiedInbox::fetch_all`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use unibox_config::model::InboxConfig;
use unibox_core::{
    BreakerSnapshot, ChannelClient, ChannelType, GetMessagesOptions, Message, SendMessageParams,
    SendReceipt, UniboxError,
};

use crate::mappings::MappingStore;
use crate::resolver::{resolve, ResolvedMessage};

/// Error text recorded for a client that reports no credentials.
pub const NOT_AUTHENTICATED: &str = "Not authenticated";

/// Outcome of one channel in one aggregation cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelResult {
    pub name: String,
    pub channel: ChannelType,
    pub success: bool,
    pub message_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChannelResult {
    fn ok(client: &dyn ChannelClient, count: usize) -> Self {
        Self {
            name: client.name().to_string(),
            channel: client.channel_type(),
            success: true,
            message_count: count,
            error: None,
        }
    }

    fn failed(name: String, channel: ChannelType, error: String) -> Self {
        Self {
            name,
            channel,
            success: false,
            message_count: 0,
            error: Some(error),
        }
    }
}

/// Merged view of one aggregation cycle.
#[derive(Debug, Clone, Serialize)]
pub struct AggregationResult {
    /// Always `true`; per-channel failures live in `channel_results`.
    pub success: bool,
    /// Successful channels' messages in registration order.
    pub messages: Vec<ResolvedMessage>,
    /// Keyed by client name.
    pub channel_results: BTreeMap<String, ChannelResult>,
    /// Raw messages fetched across all channels.
    pub total_count: usize,
    pub timestamp: DateTime<Utc>,
}

impl AggregationResult {
    /// True when there was at least one channel and none succeeded.
    pub fn all_failed(&self) -> bool {
        !self.channel_results.is_empty() && self.channel_results.values().all(|r| !r.success)
    }

    pub fn failed_channels(&self) -> impl Iterator<Item = &ChannelResult> {
        self.channel_results.values().filter(|r| !r.success)
    }
}

/// The unified inbox over a fixed set of channel clients.
pub struct UnifiedInbox {
    clients: Vec<Arc<dyn ChannelClient>>,
    mappings: MappingStore,
    fetch_limit: usize,
}

impl UnifiedInbox {
    /// `clients` are kept in registration order; their names should be
    /// unique since results are keyed by name.
    pub fn new(
        clients: Vec<Arc<dyn ChannelClient>>,
        mappings: MappingStore,
        config: &InboxConfig,
    ) -> Self {
        Self {
            clients,
            mappings,
            fetch_limit: config.fetch_limit,
        }
    }

    pub fn clients(&self) -> &[Arc<dyn ChannelClient>] {
        &self.clients
    }

    /// First registered client for `channel`.
    pub fn client(&self, channel: ChannelType) -> Option<&Arc<dyn ChannelClient>> {
        self.clients.iter().find(|c| c.channel_type() == channel)
    }

    pub fn mappings(&self) -> &MappingStore {
        &self.mappings
    }

    /// Breaker state of every client that has one.
    pub fn breaker_snapshots(&self) -> Vec<BreakerSnapshot> {
        self.clients
            .iter()
            .filter_map(|c| c.breaker_snapshot())
            .collect()
    }

    /// Fetch unread messages from every channel and resolve senders.
    #[instrument(skip(self), fields(clients = self.clients.len()))]
    pub async fn fetch_all(&self) -> AggregationResult {
        let started = Instant::now();
        let timestamp = Utc::now();

        let handles: Vec<_> = self
            .clients
            .iter()
            .map(|client| tokio::spawn(fetch_channel(Arc::clone(client), self.fetch_limit)))
            .collect();
        let joined = join_all(handles).await;

        let mut channel_results = BTreeMap::new();
        let mut raw = Vec::new();
        for (client, outcome) in self.clients.iter().zip(joined) {
            let (result, messages) = match outcome {
                Ok(fetched) => fetched,
                Err(join_err) => {
                    warn!(channel = client.name(), error = %join_err, "channel task aborted");
                    unibox_prometheus::record_channel_fetch(client.name(), "error", 0, 0.0);
                    let result = ChannelResult::failed(
                        client.name().to_string(),
                        client.channel_type(),
                        format!("channel task failed: {join_err}"),
                    );
                    (result, Vec::new())
                }
            };
            raw.extend(messages);
            channel_results.insert(result.name.clone(), result);
        }

        let total_count = raw.len();
        let mappings = match self.mappings.list().await {
            Ok(mappings) => mappings,
            Err(e) => {
                warn!(error = %e, "failed to load user mappings, resolving without them");
                Vec::new()
            }
        };
        let messages = resolve(&mappings, raw);
        let resolved = messages.iter().filter(|m| m.is_resolved()).count();

        unibox_prometheus::record_aggregation_cycle();
        unibox_prometheus::record_resolution(resolved, total_count - resolved);

        let failed = channel_results.values().filter(|r| !r.success).count();
        info!(
            total = total_count,
            resolved,
            failed_channels = failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "aggregation cycle complete"
        );

        AggregationResult {
            success: true,
            messages,
            channel_results,
            total_count,
            timestamp,
        }
    }

    /// Send through the first client registered for `channel`.
    pub async fn send(
        &self,
        channel: ChannelType,
        params: SendMessageParams,
    ) -> Result<SendReceipt, UniboxError> {
        let client = self.client(channel).ok_or_else(|| {
            UniboxError::InvalidInput(format!("no client registered for {channel}"))
        })?;
        if !client.is_authenticated().await {
            return Err(UniboxError::NotAuthenticated { channel });
        }
        client.send_message(params).await
    }
}

async fn fetch_channel(
    client: Arc<dyn ChannelClient>,
    limit: usize,
) -> (ChannelResult, Vec<Message>) {
    let name = client.name().to_string();
    let started = Instant::now();

    if !client.is_authenticated().await {
        debug!(channel = %name, "skipping unauthenticated channel");
        unibox_prometheus::record_channel_fetch(&name, "unauthenticated", 0, 0.0);
        let result =
            ChannelResult::failed(name, client.channel_type(), NOT_AUTHENTICATED.to_string());
        return (result, Vec::new());
    }

    let outcome = client.get_messages(GetMessagesOptions::unread(limit)).await;
    let seconds = started.elapsed().as_secs_f64();
    match outcome {
        Ok(messages) => {
            debug!(channel = %name, count = messages.len(), "channel fetched");
            unibox_prometheus::record_channel_fetch(&name, "ok", messages.len(), seconds);
            (ChannelResult::ok(client.as_ref(), messages.len()), messages)
        }
        Err(e) => {
            if e.is_breaker_open() {
                debug!(channel = %name, "channel skipped, breaker open");
            } else {
                warn!(channel = %name, error = %e, "channel fetch failed");
            }
            unibox_prometheus::record_channel_fetch(&name, "error", 0, seconds);
            let result = ChannelResult::failed(name, client.channel_type(), e.to_string());
            (result, Vec::new())
        }
    }
}
