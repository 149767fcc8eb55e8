// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-server channel client.
//!
//! Reads go to the server's REST API with a bearer token. Sends use the
//! incoming-webhook URL when one is configured and the REST API otherwise.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use unibox_config::model::ChatConfig;
use unibox_core::{
    BreakerSnapshot, ChannelClient, ChannelType, GetMessagesOptions, Message, MessageId,
    SendMessageParams, SendReceipt, UniboxError,
};
use unibox_resilience::{CircuitBreaker, CircuitBreakerConfig};

use crate::auth::TokenStore;
use crate::http::{build_client, endpoint, read_json, transport_error};

const CHANNEL: ChannelType = ChannelType::Chat;

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    messages: Vec<WireChatMessage>,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    #[serde(default)]
    username: String,
    #[serde(default)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct WireChatMessage {
    id: String,
    user: WireUser,
    #[serde(default)]
    text: String,
    ts: DateTime<Utc>,
    #[serde(default)]
    channel: String,
    #[serde(default)]
    unread: bool,
    #[serde(default)]
    thread_id: Option<String>,
}

impl From<WireChatMessage> for Message {
    fn from(wire: WireChatMessage) -> Self {
        let from = if wire.user.username.is_empty() {
            wire.user.id
        } else {
            wire.user.username
        };
        Message {
            id: wire.id,
            channel: CHANNEL,
            from,
            to: wire.channel,
            content: wire.text,
            subject: None,
            timestamp: wire.ts,
            is_unread: wire.unread,
            thread_id: wire.thread_id,
            reply_to_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PostResponse {
    id: String,
}

/// Chat client guarded by its own circuit breaker.
pub struct ChatClient {
    base_url: Option<String>,
    webhook_url: Option<String>,
    http: reqwest::Client,
    tokens: TokenStore,
    breaker: CircuitBreaker,
}

impl ChatClient {
    pub fn new(
        config: &ChatConfig,
        breaker: CircuitBreakerConfig,
        tokens: TokenStore,
    ) -> Result<Self, UniboxError> {
        Ok(Self {
            base_url: config.base_url.clone(),
            webhook_url: config.webhook_url.clone(),
            http: build_client(CHANNEL)?,
            tokens,
            breaker: CircuitBreaker::new("chat", breaker),
        })
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    fn base_url(&self) -> Result<&str, UniboxError> {
        self.base_url
            .as_deref()
            .ok_or(UniboxError::NotAuthenticated { channel: CHANNEL })
    }

    fn list_url(&self, options: &GetMessagesOptions) -> Result<Url, UniboxError> {
        let mut url = endpoint(CHANNEL, self.base_url()?, &["api", "messages"])?;
        {
            let mut query = url.query_pairs_mut();
            if options.unread_only {
                query.append_pair("unread", "true");
            }
            query.append_pair("count", &options.limit.to_string());
            if let Some(since) = options.since {
                query.append_pair("oldest", &since.to_rfc3339_opts(SecondsFormat::Secs, true));
            }
        }
        Ok(url)
    }

    async fn send_via_webhook(
        &self,
        webhook: &str,
        params: &SendMessageParams,
    ) -> Result<MessageId, UniboxError> {
        let body = PostMessage {
            channel: &params.to,
            text: &params.content,
            thread_id: params.thread_id.as_deref(),
        };
        self.breaker
            .execute(|| async {
                let response = self
                    .http
                    .post(webhook)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| transport_error(CHANNEL, e))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(UniboxError::Upstream {
                        channel: CHANNEL,
                        message: format!("webhook returned {status}"),
                        status: Some(status.as_u16()),
                        source: None,
                    });
                }
                Ok(())
            })
            .await?;
        // Incoming webhooks do not return a message id.
        Ok(MessageId(uuid::Uuid::new_v4().to_string()))
    }

    async fn send_via_api(&self, params: &SendMessageParams) -> Result<MessageId, UniboxError> {
        let token = self.tokens.require(CHANNEL).await?;
        let url = endpoint(CHANNEL, self.base_url()?, &["api", "messages"])?;
        let body = PostMessage {
            channel: &params.to,
            text: &params.content,
            thread_id: params.thread_id.as_deref(),
        };
        let posted = self
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
                read_json::<PostResponse>(CHANNEL, response).await
            })
            .await?;
        Ok(MessageId(posted.id))
    }
}

#[async_trait]
impl ChannelClient for ChatClient {
    fn name(&self) -> &str {
        "chat"
    }

    fn channel_type(&self) -> ChannelType {
        CHANNEL
    }

    async fn is_authenticated(&self) -> bool {
        self.base_url.is_some() && self.tokens.usable(CHANNEL).await.is_some()
    }

    async fn get_messages(
        &self,
        options: GetMessagesOptions,
    ) -> Result<Vec<Message>, UniboxError> {
        let token = self.tokens.require(CHANNEL).await?;
        let url = self.list_url(&options)?;

        let messages = self
            .breaker
            .execute(|| async {
                let response = self
                    .http
                    .get(url)
                    .bearer_auth(&token.access_token)
                    .send()
                    .await
                    .map_err(|e| transport_error(CHANNEL, e))?;
                read_json::<ListResponse>(CHANNEL, response).await
            })
            .await?
            .messages;

        debug!(count = messages.len(), "chat messages fetched");
        Ok(options.apply(messages.into_iter().map(Message::from).collect()))
    }

    async fn send_message(&self, params: SendMessageParams) -> Result<SendReceipt, UniboxError> {
        let id = match self.webhook_url.as_deref() {
            Some(webhook) => self.send_via_webhook(webhook, &params).await?,
            None => self.send_via_api(&params).await?,
        };
        debug!(id = %id.0, to = %params.to, "chat message sent");
        Ok(SendReceipt {
            id,
            channel: CHANNEL,
            sent_at: Utc::now(),
        })
    }

    fn breaker_snapshot(&self) -> Option<BreakerSnapshot> {
        Some(self.breaker.snapshot())
    }
}
