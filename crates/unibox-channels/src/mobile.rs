// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mobile messaging channel.
//!
//! The platform pushes inbound messages to a webhook; [`MobileInbox`]
//! parses those payloads and buffers the text messages in the key-value
//! store under `inbound:mobile`. [`MobileClient`] reads that buffer and
//! sends replies through the platform's Graph API.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use unibox_config::model::MobileConfig;
use unibox_core::{
    BreakerSnapshot, ChannelClient, ChannelType, GetMessagesOptions, KeyValueStore,
    KeyValueStoreExt, Message, MessageId, SendMessageParams, SendReceipt, UniboxError,
};
use unibox_resilience::{CircuitBreaker, CircuitBreakerConfig};
use unibox_storage::inbound_key;

use crate::auth::TokenStore;
use crate::http::{build_client, endpoint, read_json, transport_error};

const CHANNEL: ChannelType = ChannelType::Mobile;

/// Oldest buffered messages are dropped beyond this many.
pub const MAX_BUFFERED: usize = 1000;

#[derive(Debug, Deserialize)]
struct WebhookEnvelope {
    #[serde(default)]
    entry: Vec<WebhookEntry>,
}

#[derive(Debug, Deserialize)]
struct WebhookEntry {
    #[serde(default)]
    changes: Vec<WebhookChange>,
}

#[derive(Debug, Deserialize)]
struct WebhookChange {
    #[serde(default)]
    field: String,
    value: WebhookValue,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookValue {
    #[serde(default)]
    metadata: Option<WebhookMetadata>,
    #[serde(default)]
    messages: Vec<WebhookMessage>,
}

#[derive(Debug, Deserialize)]
struct WebhookMetadata {
    #[serde(default)]
    display_phone_number: String,
}

#[derive(Debug, Deserialize)]
struct WebhookMessage {
    from: String,
    id: String,
    /// Unix seconds, sent as a string.
    timestamp: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<WebhookText>,
    #[serde(default)]
    context: Option<WebhookContext>,
}

#[derive(Debug, Deserialize)]
struct WebhookText {
    body: String,
}

#[derive(Debug, Deserialize)]
struct WebhookContext {
    id: String,
}

fn parse_unix(ts: &str) -> Option<DateTime<Utc>> {
    ts.trim()
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

/// Extract the text messages carried by one webhook payload.
///
/// Non-message changes and non-text messages are skipped.
pub fn parse_webhook(payload: &serde_json::Value) -> Result<Vec<Message>, UniboxError> {
    let envelope = WebhookEnvelope::deserialize(payload)
        .map_err(|e| UniboxError::InvalidInput(format!("malformed mobile webhook payload: {e}")))?;

    let mut messages = Vec::new();
    for change in envelope.entry.into_iter().flat_map(|e| e.changes) {
        if change.field != "messages" {
            continue;
        }
        let to = change
            .value
            .metadata
            .map(|m| m.display_phone_number)
            .unwrap_or_default();
        for wire in change.value.messages {
            let Some(text) = wire.text.filter(|_| wire.kind == "text") else {
                debug!(id = %wire.id, kind = %wire.kind, "skipping non-text mobile message");
                continue;
            };
            let Some(timestamp) = parse_unix(&wire.timestamp) else {
                warn!(id = %wire.id, timestamp = %wire.timestamp, "skipping mobile message with bad timestamp");
                continue;
            };
            messages.push(Message {
                id: wire.id,
                channel: CHANNEL,
                from: wire.from,
                to: to.clone(),
                content: text.body,
                subject: None,
                timestamp,
                is_unread: true,
                thread_id: None,
                reply_to_id: wire.context.map(|c| c.id),
            });
        }
    }
    Ok(messages)
}

/// Buffer of inbound mobile messages in the key-value store.
#[derive(Clone)]
pub struct MobileInbox {
    store: Arc<dyn KeyValueStore>,
}

impl MobileInbox {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// All buffered messages in arrival order.
    pub async fn messages(&self) -> Result<Vec<Message>, UniboxError> {
        Ok(self
            .store
            .get::<Vec<Message>>(&inbound_key(CHANNEL))
            .await?
            .unwrap_or_default())
    }

    /// Parse `payload` and append messages not already buffered.
    ///
    /// Returns how many new messages were stored.
    pub async fn ingest(&self, payload: &serde_json::Value) -> Result<usize, UniboxError> {
        let incoming = parse_webhook(payload)?;
        if incoming.is_empty() {
            return Ok(0);
        }

        let mut buffered = self.messages().await?;
        let mut seen: HashSet<String> = buffered.iter().map(|m| m.id.clone()).collect();
        let before = buffered.len();
        for message in incoming {
            if seen.insert(message.id.clone()) {
                buffered.push(message);
            }
        }
        let added = buffered.len() - before;

        if buffered.len() > MAX_BUFFERED {
            let excess = buffered.len() - MAX_BUFFERED;
            buffered.drain(..excess);
        }
        self.store.save(&inbound_key(CHANNEL), &buffered).await?;

        info!(added, buffered = buffered.len(), "mobile webhook ingested");
        Ok(added)
    }
}

#[derive(Debug, Serialize)]
struct GraphText<'a> {
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct GraphContext<'a> {
    message_id: &'a str,
}

#[derive(Debug, Serialize)]
struct GraphSend<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    text: GraphText<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<GraphContext<'a>>,
}

#[derive(Debug, Deserialize)]
struct GraphSendResponse {
    #[serde(default)]
    messages: Vec<GraphMessageRef>,
}

#[derive(Debug, Deserialize)]
struct GraphMessageRef {
    id: String,
}

/// Mobile client guarded by its own circuit breaker.
pub struct MobileClient {
    base_url: String,
    phone_number_id: Option<String>,
    http: reqwest::Client,
    tokens: TokenStore,
    inbox: MobileInbox,
    breaker: CircuitBreaker,
}

impl MobileClient {
    pub fn new(
        config: &MobileConfig,
        breaker: CircuitBreakerConfig,
        tokens: TokenStore,
        inbox: MobileInbox,
    ) -> Result<Self, UniboxError> {
        Ok(Self {
            base_url: config.base_url.clone(),
            phone_number_id: config.phone_number_id.clone(),
            http: build_client(CHANNEL)?,
            tokens,
            inbox,
            breaker: CircuitBreaker::new("mobile", breaker),
        })
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn inbox(&self) -> &MobileInbox {
        &self.inbox
    }

    fn phone_number_id(&self) -> Result<&str, UniboxError> {
        self.phone_number_id
            .as_deref()
            .ok_or(UniboxError::NotAuthenticated { channel: CHANNEL })
    }
}

#[async_trait]
impl ChannelClient for MobileClient {
    fn name(&self) -> &str {
        "mobile"
    }

    fn channel_type(&self) -> ChannelType {
        CHANNEL
    }

    async fn is_authenticated(&self) -> bool {
        self.phone_number_id.is_some() && self.tokens.usable(CHANNEL).await.is_some()
    }

    /// Buffered webhook messages, newest first.
    async fn get_messages(
        &self,
        options: GetMessagesOptions,
    ) -> Result<Vec<Message>, UniboxError> {
        let mut messages = self.breaker.execute(|| self.inbox.messages()).await?;
        messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(options.apply(messages))
    }

    async fn send_message(&self, params: SendMessageParams) -> Result<SendReceipt, UniboxError> {
        let token = self.tokens.require(CHANNEL).await?;
        let url = endpoint(CHANNEL, &self.base_url, &[self.phone_number_id()?, "messages"])?;
        let body = GraphSend {
            messaging_product: "whatsapp",
            to: &params.to,
            kind: "text",
            text: GraphText {
                body: &params.content,
            },
            context: params
                .reply_to_id
                .as_deref()
                .map(|id| GraphContext { message_id: id }),
        };

        let response = self
            .breaker
            .execute(|| async {
                let response = self
                    .http
                    .post(url)
                    .bearer_auth(&token.access_token)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| transport_error(CHANNEL, e))?;
                read_json::<GraphSendResponse>(CHANNEL, response).await
            })
            .await?;

        let id = response
            .messages
            .into_iter()
            .next()
            .map(|m| m.id)
            .ok_or_else(|| UniboxError::upstream(CHANNEL, "send response carried no message id"))?;

        debug!(id = %id, to = %params.to, "mobile message sent");
        Ok(SendReceipt {
            id: MessageId(id),
            channel: CHANNEL,
            sent_at: Utc::now(),
        })
    }

    fn breaker_snapshot(&self) -> Option<BreakerSnapshot> {
        Some(self.breaker.snapshot())
    }
}
