// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Async circuit breaker wrapping fallible upstream operations.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::time::Instant;
use unibox_core::{BreakerSnapshot, CircuitState, UniboxError};

use crate::config::CircuitBreakerConfig;
use crate::observer::{default_observer, BreakerEvent, BreakerObserver};
use crate::state::{Admission, BreakerCore, CallOutcome};

/// Guards calls to one upstream dependency.
///
/// Each channel client owns its own breaker, so one unhealthy channel never
/// throttles another. The breaker is `Send + Sync` and is shared by
/// reference across concurrent callers.
pub struct CircuitBreaker {
    name: String,
    core: Mutex<BreakerCore>,
    observer: Arc<dyn BreakerObserver>,
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}

impl CircuitBreaker {
    /// Create a breaker that logs and records metrics for every event.
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self::with_observer(name, config, default_observer())
    }

    pub fn with_observer(
        name: impl Into<String>,
        config: CircuitBreakerConfig,
        observer: Arc<dyn BreakerObserver>,
    ) -> Self {
        Self {
            name: name.into(),
            core: Mutex::new(BreakerCore::new(config)),
            observer,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> CircuitBreakerConfig {
        self.lock().config().clone()
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state()
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        self.lock().snapshot(&self.name, Instant::now())
    }

    /// Run `op` under the breaker.
    ///
    /// Returns [`UniboxError::BreakerOpen`] without invoking `op` when the
    /// breaker rejects the call, and [`UniboxError::Timeout`] when `op` runs
    /// past the configured timeout. A timed-out operation is dropped.
    /// Any error `op` returns is passed through unchanged and counts as a
    /// failure.
    pub async fn execute<T, F, Fut>(&self, op: F) -> Result<T, UniboxError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, UniboxError>>,
    {
        let (admission, events, timeout) = {
            let mut core = self.lock();
            let (admission, events) = core.admit(Instant::now());
            (admission, events, core.config().timeout)
        };
        self.notify(&events);

        let probe = match admission {
            Admission::Allowed { probe } => probe,
            Admission::Rejected => {
                return Err(UniboxError::BreakerOpen {
                    name: self.name.clone(),
                });
            }
        };

        let mut guard = ProbeGuard {
            breaker: self,
            armed: probe,
        };

        let result = tokio::time::timeout(timeout, op()).await;
        guard.armed = false;

        let (outcome, result) = match result {
            Ok(Ok(value)) => (CallOutcome::Success, Ok(value)),
            Ok(Err(e)) => (CallOutcome::Failure, Err(e)),
            Err(_) => (
                CallOutcome::Timeout,
                Err(UniboxError::Timeout { duration: timeout }),
            ),
        };

        let events = self.lock().record(outcome, probe, Instant::now());
        self.notify(&events);
        result
    }

    /// Open the breaker immediately and restart the reset timer.
    pub fn force_open(&self) {
        let events = self.lock().force_open(Instant::now());
        self.notify(&events);
    }

    /// Close the breaker immediately and clear the rolling window.
    pub fn force_close(&self) {
        let events = self.lock().force_close();
        self.notify(&events);
    }

    /// Zero all statistics without changing state.
    pub fn reset_counters(&self) {
        self.lock().reset_counters();
    }

    // The core is never left half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, BreakerCore> {
        self.core.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn notify(&self, events: &[BreakerEvent]) {
        for event in events {
            self.observer.on_event(&self.name, *event);
        }
    }
}

/// Frees the half-open probe slot if the caller drops `execute` mid-flight.
struct ProbeGuard<'a> {
    breaker: &'a CircuitBreaker,
    armed: bool,
}

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.breaker.lock().release_probe();
        }
    }
}
