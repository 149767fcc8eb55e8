// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The breaker state machine, free of locking, clocks and I/O.
//!
//! Every method takes `now` explicitly and returns the notifications the
//! caller should emit, so transitions can be driven step by step in tests.
//!
//! | From      | Event                                  | To        |
//! |-----------|----------------------------------------|-----------|
//! | Closed    | calls >= volume && error% >= threshold | Open      |
//! | Open      | reset timeout elapsed, call arrives    | HalfOpen  |
//! | HalfOpen  | probe succeeds                         | Closed    |
//! | HalfOpen  | probe fails or times out               | Open      |

use tokio::time::Instant;
use unibox_core::{BreakerSnapshot, CircuitState};

use crate::config::CircuitBreakerConfig;
use crate::observer::BreakerEvent;
use crate::window::RollingWindow;

/// Whether a call may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Invoke the operation. `probe` is set for the single half-open trial.
    Allowed { probe: bool },
    /// Fail fast; the operation must not be invoked.
    Rejected,
}

/// How a guarded call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    Failure,
    Timeout,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Counters {
    fires: u64,
    successes: u64,
    failures: u64,
    timeouts: u64,
    rejects: u64,
}

/// Breaker state plus the statistics that drive its transitions.
#[derive(Debug, Clone)]
pub struct BreakerCore {
    config: CircuitBreakerConfig,
    state: CircuitState,
    window: RollingWindow,
    last_opened_at: Option<Instant>,
    probe_in_flight: bool,
    counters: Counters,
}

impl BreakerCore {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        let window = RollingWindow::new(
            config.rolling_window,
            config.bucket_len(),
            config.rolling_buckets,
        );
        Self {
            config,
            state: CircuitState::Closed,
            window,
            last_opened_at: None,
            probe_in_flight: false,
            counters: Counters::default(),
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Decide whether a call arriving at `now` may run.
    pub fn admit(&mut self, now: Instant) -> (Admission, Vec<BreakerEvent>) {
        let mut events = Vec::new();

        if self.state == CircuitState::Open {
            if self.reset_elapsed(now) {
                self.state = CircuitState::HalfOpen;
                self.probe_in_flight = false;
                events.push(BreakerEvent::HalfOpen);
            } else {
                self.counters.rejects += 1;
                events.push(BreakerEvent::Reject);
                return (Admission::Rejected, events);
            }
        }

        let admission = match self.state {
            CircuitState::HalfOpen if self.probe_in_flight => {
                self.counters.rejects += 1;
                events.push(BreakerEvent::Reject);
                Admission::Rejected
            }
            CircuitState::HalfOpen => {
                self.probe_in_flight = true;
                self.counters.fires += 1;
                Admission::Allowed { probe: true }
            }
            _ => {
                self.counters.fires += 1;
                Admission::Allowed { probe: false }
            }
        };
        (admission, events)
    }

    /// Apply the outcome of a call admitted earlier.
    ///
    /// Outcomes of ordinary calls that finish after the breaker left
    /// `Closed` only touch the cumulative counters.
    pub fn record(&mut self, outcome: CallOutcome, probe: bool, now: Instant) -> Vec<BreakerEvent> {
        let mut events = Vec::new();

        match outcome {
            CallOutcome::Success => {
                self.counters.successes += 1;
                events.push(BreakerEvent::Success);
            }
            CallOutcome::Failure => {
                self.counters.failures += 1;
                events.push(BreakerEvent::Failure);
            }
            CallOutcome::Timeout => {
                self.counters.failures += 1;
                self.counters.timeouts += 1;
                events.push(BreakerEvent::Timeout);
            }
        }

        if probe {
            self.probe_in_flight = false;
            if self.state == CircuitState::HalfOpen {
                if outcome == CallOutcome::Success {
                    self.close();
                    events.push(BreakerEvent::Close);
                } else {
                    self.open(now);
                    events.push(BreakerEvent::Open);
                }
            }
            return events;
        }

        if self.state != CircuitState::Closed {
            return events;
        }

        match outcome {
            CallOutcome::Success => self.window.record_success(now),
            CallOutcome::Failure | CallOutcome::Timeout => self.window.record_failure(now),
        }

        if self.should_trip(now) {
            self.open(now);
            events.push(BreakerEvent::Open);
        }
        events
    }

    /// Give back the probe slot of a probe whose caller went away before
    /// it finished. The breaker stays half-open for the next caller.
    pub fn release_probe(&mut self) {
        self.probe_in_flight = false;
    }

    /// Operator control: open now and restart the reset timer.
    pub fn force_open(&mut self, now: Instant) -> Vec<BreakerEvent> {
        let was_open = self.state == CircuitState::Open;
        self.open(now);
        if was_open {
            Vec::new()
        } else {
            vec![BreakerEvent::Open]
        }
    }

    /// Operator control: close now and clear the rolling window.
    pub fn force_close(&mut self) -> Vec<BreakerEvent> {
        let was_closed = self.state == CircuitState::Closed;
        self.close();
        if was_closed {
            Vec::new()
        } else {
            vec![BreakerEvent::Close]
        }
    }

    /// Operator control: zero the rolling window and cumulative counters
    /// without changing state.
    pub fn reset_counters(&mut self) {
        self.window.clear();
        self.counters = Counters::default();
    }

    pub fn snapshot(&self, name: &str, now: Instant) -> BreakerSnapshot {
        let totals = self.window.totals(now);
        let retry_after_ms = match (self.state, self.last_opened_at) {
            (CircuitState::Open, Some(opened)) => {
                let reopen = opened + self.config.reset_timeout;
                Some(reopen.saturating_duration_since(now).as_millis() as u64)
            }
            _ => None,
        };
        BreakerSnapshot {
            name: name.to_string(),
            state: self.state,
            window_calls: totals.calls(),
            window_failures: totals.failures,
            fires: self.counters.fires,
            successes: self.counters.successes,
            failures: self.counters.failures,
            timeouts: self.counters.timeouts,
            rejects: self.counters.rejects,
            retry_after_ms,
        }
    }

    fn should_trip(&self, now: Instant) -> bool {
        let totals = self.window.totals(now);
        totals.calls() >= u64::from(self.config.volume_threshold)
            && totals.failure_rate_at_least(self.config.error_threshold_percentage)
    }

    fn reset_elapsed(&self, now: Instant) -> bool {
        self.last_opened_at
            .is_none_or(|opened| now.saturating_duration_since(opened) >= self.config.reset_timeout)
    }

    fn open(&mut self, now: Instant) {
        self.state = CircuitState::Open;
        self.last_opened_at = Some(now);
        self.probe_in_flight = false;
    }

    fn close(&mut self) {
        self.state = CircuitState::Closed;
        self.last_opened_at = None;
        self.probe_in_flight = false;
        self.window.clear();
    }
}
