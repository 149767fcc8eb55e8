// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Circuit breaker state types shared between the resilience crate and the
//! channel clients that own breakers.

use serde::{Deserialize, Serialize};
use strum::Display;

/// The three states of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Calls flow through; outcomes feed the rolling window.
    Closed,
    /// Calls are rejected until the reset timeout elapses.
    Open,
    /// A single probe call is allowed through.
    HalfOpen,
}

/// Point-in-time view of a breaker, for status output and health checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    /// Calls (successes + failures) inside the rolling window.
    pub window_calls: u64,
    /// Failures (errors + timeouts) inside the rolling window.
    pub window_failures: u64,
    /// Cumulative counters since construction or the last counter reset.
    pub fires: u64,
    pub successes: u64,
    pub failures: u64,
    pub timeouts: u64,
    pub rejects: u64,
    /// Milliseconds until an open breaker admits a probe, if open.
    pub retry_after_ms: Option<u64>,
}

impl BreakerSnapshot {
    /// Failure percentage of the rolling window (0 when empty).
    pub fn window_error_percentage(&self) -> f64 {
        if self.window_calls == 0 {
            0.0
        } else {
            self.window_failures as f64 * 100.0 / self.window_calls as f64
        }
    }
}
