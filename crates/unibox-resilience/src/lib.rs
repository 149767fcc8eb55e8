// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fault isolation for upstream channel calls.
//!
//! A [`CircuitBreaker`] tracks outcomes in a rolling window and fails fast
//! while its upstream is unhealthy. State changes are reported through a
//! [`BreakerObserver`].

pub mod breaker;
pub mod config;
pub mod observer;
pub mod state;
pub mod window;

pub use breaker::CircuitBreaker;
pub use config::CircuitBreakerConfig;
pub use observer::{
    default_observer, BreakerEvent, BreakerObserver, FanoutObserver, MetricsObserver,
    TracingObserver,
};
pub use state::{Admission, BreakerCore, CallOutcome};
pub use unibox_core::{BreakerSnapshot, CircuitState};
