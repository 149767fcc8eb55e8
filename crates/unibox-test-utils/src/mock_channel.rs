// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scriptable channel client for deterministic testing.
//!
//! `MockChannelClient` implements `ChannelClient` with a configurable
//! authentication flag, a scripted fetch behaviour and captured sends.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use unibox_core::{
    BreakerSnapshot, ChannelClient, ChannelType, GetMessagesOptions, Message, MessageId,
    SendMessageParams, SendReceipt, UniboxError,
};
use unibox_resilience::CircuitBreaker;

/// What `get_messages` does on the next call.
#[derive(Debug, Clone)]
pub enum FetchBehaviour {
    /// Return these messages, filtered by the request options.
    Messages(Vec<Message>),
    /// Fail with an upstream error carrying this text.
    Fail(String),
    /// Panic inside the fetch.
    Panic,
}

/// A mock channel client for testing.
///
/// Every `get_messages` call is counted, including ones that fail. When a
/// breaker is attached the scripted behaviour runs inside it.
pub struct MockChannelClient {
    name: String,
    channel: ChannelType,
    authenticated: AtomicBool,
    behaviour: Mutex<FetchBehaviour>,
    delay: Option<Duration>,
    fetches: AtomicUsize,
    requests: Mutex<Vec<GetMessagesOptions>>,
    sent: Mutex<Vec<SendMessageParams>>,
    breaker: Option<CircuitBreaker>,
}

impl MockChannelClient {
    /// Authenticated client returning no messages.
    pub fn new(name: impl Into<String>, channel: ChannelType) -> Self {
        Self {
            name: name.into(),
            channel,
            authenticated: AtomicBool::new(true),
            behaviour: Mutex::new(FetchBehaviour::Messages(Vec::new())),
            delay: None,
            fetches: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            breaker: None,
        }
    }

    pub fn with_messages(self, messages: Vec<Message>) -> Self {
        self.with_behaviour(FetchBehaviour::Messages(messages))
    }

    pub fn failing(self, error: impl Into<String>) -> Self {
        self.with_behaviour(FetchBehaviour::Fail(error.into()))
    }

    pub fn panicking(self) -> Self {
        self.with_behaviour(FetchBehaviour::Panic)
    }

    pub fn with_behaviour(mut self, behaviour: FetchBehaviour) -> Self {
        self.behaviour = Mutex::new(behaviour);
        self
    }

    pub fn unauthenticated(self) -> Self {
        self.authenticated.store(false, Ordering::SeqCst);
        self
    }

    /// Sleep this long inside every fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_breaker(mut self, breaker: CircuitBreaker) -> Self {
        self.breaker = Some(breaker);
        self
    }

    pub fn set_authenticated(&self, authenticated: bool) {
        self.authenticated.store(authenticated, Ordering::SeqCst);
    }

    pub async fn set_behaviour(&self, behaviour: FetchBehaviour) {
        *self.behaviour.lock().await = behaviour;
    }

    /// Number of `get_messages` calls that reached the scripted behaviour.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Options passed to every `get_messages` call, in order.
    pub async fn requests(&self) -> Vec<GetMessagesOptions> {
        self.requests.lock().await.clone()
    }

    /// Parameters passed to `send_message`, in order.
    pub async fn sent_messages(&self) -> Vec<SendMessageParams> {
        self.sent.lock().await.clone()
    }

    pub fn breaker(&self) -> Option<&CircuitBreaker> {
        self.breaker.as_ref()
    }

    async fn scripted_fetch(&self, options: &GetMessagesOptions) -> Result<Vec<Message>, UniboxError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let behaviour = self.behaviour.lock().await.clone();
        debug!(channel = %self.name, ?behaviour, "mock channel fetch");
        match behaviour {
            FetchBehaviour::Messages(messages) => Ok(options.apply(messages)),
            FetchBehaviour::Fail(error) => Err(UniboxError::upstream(self.channel, error)),
            FetchBehaviour::Panic => panic!("mock channel `{}` panicked", self.name),
        }
    }
}

#[async_trait]
impl ChannelClient for MockChannelClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn channel_type(&self) -> ChannelType {
        self.channel
    }

    async fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    async fn get_messages(
        &self,
        options: GetMessagesOptions,
    ) -> Result<Vec<Message>, UniboxError> {
        self.requests.lock().await.push(options.clone());
        match &self.breaker {
            Some(breaker) => breaker.execute(|| self.scripted_fetch(&options)).await,
            None => self.scripted_fetch(&options).await,
        }
    }

    async fn send_message(&self, params: SendMessageParams) -> Result<SendReceipt, UniboxError> {
        if !self.authenticated.load(Ordering::SeqCst) {
            return Err(UniboxError::NotAuthenticated {
                channel: self.channel,
            });
        }
        debug!(channel = %self.name, to = %params.to, "mock channel send");
        self.sent.lock().await.push(params);
        Ok(SendReceipt {
            id: MessageId(format!("mock-msg-{}", uuid::Uuid::new_v4())),
            channel: self.channel,
            sent_at: Utc::now(),
        })
    }

    fn breaker_snapshot(&self) -> Option<BreakerSnapshot> {
        self.breaker.as_ref().map(CircuitBreaker::snapshot)
    }
}
