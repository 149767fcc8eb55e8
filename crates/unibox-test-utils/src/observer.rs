// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Breaker observer that records every notification.

use std::sync::Mutex;

use unibox_resilience::{BreakerEvent, BreakerObserver};

#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<(String, BreakerEvent)>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification as `(breaker, event)`.
    pub fn events(&self) -> Vec<(String, BreakerEvent)> {
        self.lock().clone()
    }

    /// Only state transitions, in order.
    pub fn transitions(&self) -> Vec<BreakerEvent> {
        self.lock()
            .iter()
            .map(|(_, event)| *event)
            .filter(BreakerEvent::is_transition)
            .collect()
    }

    pub fn count(&self, event: BreakerEvent) -> usize {
        self.lock().iter().filter(|(_, e)| *e == event).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, BreakerEvent)>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl BreakerObserver for RecordingObserver {
    fn on_event(&self, breaker: &str, event: BreakerEvent) {
        self.lock().push((breaker.to_string(), event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let observer = RecordingObserver::new();
        observer.on_event("chat", BreakerEvent::Failure);
        observer.on_event("chat", BreakerEvent::Open);
        observer.on_event("chat", BreakerEvent::Reject);

        assert_eq!(observer.transitions(), vec![BreakerEvent::Open]);
        assert_eq!(observer.count(BreakerEvent::Reject), 1);
        assert_eq!(observer.events()[0].0, "chat");
    }
}
