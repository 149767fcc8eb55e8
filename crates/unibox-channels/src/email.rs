// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Email channel client for a REST mailbox API.
//!
//! `GET {base_url}/messages` lists messages and `POST {base_url}/messages`
//! sends one. Requests carry the stored bearer token.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use unibox_config::model::EmailConfig;
use unibox_core::{
    BreakerSnapshot, ChannelClient, ChannelType, GetMessagesOptions, Message, MessageId,
    SendMessageParams, SendReceipt, UniboxError,
};
use unibox_resilience::{CircuitBreaker, CircuitBreakerConfig};

use crate::auth::TokenStore;
use crate::http::{build_client, endpoint, read_json, transport_error};

const CHANNEL: ChannelType = ChannelType::Email;

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    messages: Vec<WireEmail>,
}

#[derive(Debug, Deserialize)]
struct WireEmail {
    id: String,
    from: String,
    #[serde(default)]
    to: String,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    body: String,
    received_at: DateTime<Utc>,
    #[serde(default)]
    unread: bool,
    #[serde(default)]
    thread_id: Option<String>,
    #[serde(default)]
    in_reply_to: Option<String>,
}

impl From<WireEmail> for Message {
    fn from(wire: WireEmail) -> Self {
        Message {
            id: wire.id,
            channel: CHANNEL,
            from: wire.from,
            to: wire.to,
            content: wire.body,
            subject: wire.subject,
            timestamp: wire.received_at,
            is_unread: wire.unread,
            thread_id: wire.thread_id,
            reply_to_id: wire.in_reply_to,
        }
    }
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    to: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<&'a str>,
    body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    in_reply_to: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

/// Mailbox client guarded by its own circuit breaker.
pub struct EmailClient {
    base_url: Option<String>,
    http: reqwest::Client,
    tokens: TokenStore,
    breaker: CircuitBreaker,
}

impl EmailClient {
    pub fn new(
        config: &EmailConfig,
        breaker: CircuitBreakerConfig,
        tokens: TokenStore,
    ) -> Result<Self, UniboxError> {
        Ok(Self {
            base_url: config.base_url.clone(),
            http: build_client(CHANNEL)?,
            tokens,
            breaker: CircuitBreaker::new("email", breaker),
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
        let mut url = endpoint(CHANNEL, self.base_url()?, &["messages"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("unread_only", if options.unread_only { "true" } else { "false" });
            query.append_pair("limit", &options.limit.to_string());
            if let Some(since) = options.since {
                query.append_pair("since", &since.to_rfc3339_opts(SecondsFormat::Secs, true));
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl ChannelClient for EmailClient {
    fn name(&self) -> &str {
        "email"
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

        debug!(count = messages.len(), "email messages fetched");
        Ok(options.apply(messages.into_iter().map(Message::from).collect()))
    }

    async fn send_message(&self, params: SendMessageParams) -> Result<SendReceipt, UniboxError> {
        let token = self.tokens.require(CHANNEL).await?;
        let url = endpoint(CHANNEL, self.base_url()?, &["messages"])?;
        let body = SendRequest {
            to: &params.to,
            subject: params.subject.as_deref(),
            body: &params.content,
            thread_id: params.thread_id.as_deref(),
            in_reply_to: params.reply_to_id.as_deref(),
        };

        let sent = self
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
                read_json::<SendResponse>(CHANNEL, response).await
            })
            .await?;

        debug!(id = %sent.id, to = %params.to, "email sent");
        Ok(SendReceipt {
            id: MessageId(sent.id),
            channel: CHANNEL,
            sent_at: Utc::now(),
        })
    }

    fn breaker_snapshot(&self) -> Option<BreakerSnapshot> {
        Some(self.breaker.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use unibox_core::CircuitState;
    use unibox_storage::MemoryStore;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::auth::AuthToken;

    async fn client(server: &MockServer, with_token: bool) -> EmailClient {
        let tokens = TokenStore::new(Arc::new(MemoryStore::new()));
        if with_token {
            tokens.set(CHANNEL, &AuthToken::new("tok-1")).await.unwrap();
        }
        let config = EmailConfig {
            base_url: Some(server.uri()),
            breaker: None,
        };
        let breaker = CircuitBreakerConfig::default()
            .with_thresholds(2, 50)
            .with_timeout(Duration::from_millis(500));
        EmailClient::new(&config, breaker, tokens).unwrap()
    }

    fn wire(id: &str, unread: bool) -> serde_json::Value {
        json!({
            "id": id,
            "from": "Alice <alice@co.com>",
            "to": "me@co.com",
            "subject": "Quarterly numbers",
            "body": "see attached",
            "received_at": "2026-03-01T12:00:00Z",
            "unread": unread,
            "thread_id": "t-1"
        })
    }

    #[tokio::test]
    async fn fetches_unread_messages_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/messages"))
            .and(query_param("unread_only", "true"))
            .and(query_param("limit", "10"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"messages": [wire("m1", true), wire("m2", false)]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server, true).await;
        let messages = client
            .get_messages(GetMessagesOptions::unread(10))
            .await
            .unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, "m1");
        assert_eq!(messages[0].channel, ChannelType::Email);
        assert_eq!(messages[0].subject.as_deref(), Some("Quarterly numbers"));
        assert_eq!(messages[0].thread_id.as_deref(), Some("t-1"));
    }

    #[tokio::test]
    async fn unauthenticated_without_token_or_url() {
        let server = MockServer::start().await;
        assert!(!client(&server, false).await.is_authenticated().await);
        assert!(client(&server, true).await.is_authenticated().await);

        let tokens = TokenStore::new(Arc::new(MemoryStore::new()));
        tokens.set(CHANNEL, &AuthToken::new("tok")).await.unwrap();
        let unconfigured =
            EmailClient::new(&EmailConfig::default(), CircuitBreakerConfig::default(), tokens)
                .unwrap();
        assert!(!unconfigured.is_authenticated().await);
    }

    #[tokio::test]
    async fn server_errors_trip_breaker() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .expect(2)
            .mount(&server)
            .await;

        let client = client(&server, true).await;
        for _ in 0..2 {
            let err = client
                .get_messages(GetMessagesOptions::unread(10))
                .await
                .unwrap_err();
            assert!(matches!(err, UniboxError::Upstream { status: Some(503), .. }));
        }
        assert_eq!(client.breaker().state(), CircuitState::Open);

        let err = client
            .get_messages(GetMessagesOptions::unread(10))
            .await
            .unwrap_err();
        assert!(err.is_breaker_open());
        assert_eq!(client.breaker_snapshot().unwrap().rejects, 1);
    }

    #[tokio::test]
    async fn sends_reply_in_thread() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(body_partial_json(json!({
                "to": "alice@co.com",
                "body": "thanks",
                "in_reply_to": "m1"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "sent-9"})))
            .mount(&server)
            .await;

        let client = client(&server, true).await;
        let mut params = SendMessageParams::new("alice@co.com", "thanks");
        params.reply_to_id = Some("m1".into());
        let receipt = client.send_message(params).await.unwrap();
        assert_eq!(receipt.id, MessageId("sent-9".into()));
        assert_eq!(receipt.channel, ChannelType::Email);
    }
}
