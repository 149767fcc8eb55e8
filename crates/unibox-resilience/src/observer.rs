// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Breaker notifications and the observers that consume them.
//!
//! Observers are told about every outcome and transition after the state
//! change has been applied. They cannot influence the state machine.

use std::sync::Arc;

use tracing::{debug, info, trace, warn};

/// A single breaker notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreakerEvent {
    /// Transitioned to `Open`.
    Open,
    /// Transitioned to `HalfOpen`; a probe is being admitted.
    HalfOpen,
    /// Transitioned to `Closed`.
    Close,
    /// The operation completed successfully.
    Success,
    /// The operation returned an error.
    Failure,
    /// The operation exceeded the per-call timeout.
    Timeout,
    /// The call was rejected without invoking the operation.
    Reject,
}

impl BreakerEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::HalfOpen => "half_open",
            Self::Close => "close",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Timeout => "timeout",
            Self::Reject => "reject",
        }
    }

    /// Whether this event is a state transition rather than a call outcome.
    pub fn is_transition(&self) -> bool {
        matches!(self, Self::Open | Self::HalfOpen | Self::Close)
    }
}

/// Receives breaker notifications.
pub trait BreakerObserver: Send + Sync {
    fn on_event(&self, breaker: &str, event: BreakerEvent);
}

/// Logs notifications through `tracing`; transitions at info/warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl BreakerObserver for TracingObserver {
    fn on_event(&self, breaker: &str, event: BreakerEvent) {
        match event {
            BreakerEvent::Open => warn!(breaker, "circuit breaker opened"),
            BreakerEvent::HalfOpen => info!(breaker, "circuit breaker half-open, admitting probe"),
            BreakerEvent::Close => info!(breaker, "circuit breaker closed"),
            BreakerEvent::Reject => debug!(breaker, "call rejected by open circuit breaker"),
            BreakerEvent::Failure | BreakerEvent::Timeout => {
                debug!(breaker, outcome = event.as_str(), "guarded call failed")
            }
            BreakerEvent::Success => trace!(breaker, "guarded call succeeded"),
        }
    }
}

/// Counts notifications in `unibox_breaker_events_total`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsObserver;

impl BreakerObserver for MetricsObserver {
    fn on_event(&self, breaker: &str, event: BreakerEvent) {
        unibox_prometheus::record_breaker_event(breaker, event.as_str());
    }
}

/// Forwards every notification to each inner observer in order.
#[derive(Default, Clone)]
pub struct FanoutObserver {
    observers: Vec<Arc<dyn BreakerObserver>>,
}

impl FanoutObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn BreakerObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl BreakerObserver for FanoutObserver {
    fn on_event(&self, breaker: &str, event: BreakerEvent) {
        for observer in &self.observers {
            observer.on_event(breaker, event);
        }
    }
}

/// Logging plus metrics, the observer every client breaker gets by default.
pub fn default_observer() -> Arc<dyn BreakerObserver> {
    Arc::new(
        FanoutObserver::new()
            .with(Arc::new(TracingObserver))
            .with(Arc::new(MetricsObserver)),
    )
}
