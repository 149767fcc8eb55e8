// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bucketed rolling window of call outcomes.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    start: Instant,
    successes: u64,
    failures: u64,
}

/// Success/failure counts over the last `window`, kept in at most
/// `max_buckets` buckets so memory stays bounded under any call rate.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    window: Duration,
    bucket_len: Duration,
    max_buckets: usize,
    buckets: VecDeque<Bucket>,
}

/// Totals over the live part of a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowTotals {
    pub successes: u64,
    pub failures: u64,
}

impl WindowTotals {
    pub fn calls(&self) -> u64 {
        self.successes + self.failures
    }

    /// True when `failures / calls >= percentage / 100`.
    pub fn failure_rate_at_least(&self, percentage: u8) -> bool {
        self.calls() > 0 && self.failures * 100 >= u64::from(percentage) * self.calls()
    }
}

impl RollingWindow {
    pub fn new(window: Duration, bucket_len: Duration, max_buckets: u32) -> Self {
        Self {
            window,
            bucket_len,
            max_buckets: max_buckets.max(1) as usize,
            buckets: VecDeque::new(),
        }
    }

    pub fn record_success(&mut self, now: Instant) {
        self.current(now).successes += 1;
    }

    pub fn record_failure(&mut self, now: Instant) {
        self.current(now).failures += 1;
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    /// Totals of buckets that are still inside the window at `now`.
    pub fn totals(&self, now: Instant) -> WindowTotals {
        self.buckets
            .iter()
            .filter(|b| self.is_live(b, now))
            .fold(WindowTotals::default(), |acc, b| WindowTotals {
                successes: acc.successes + b.successes,
                failures: acc.failures + b.failures,
            })
    }

    fn is_live(&self, bucket: &Bucket, now: Instant) -> bool {
        now.saturating_duration_since(bucket.start) < self.window
    }

    fn current(&mut self, now: Instant) -> &mut Bucket {
        while let Some(front) = self.buckets.front() {
            if self.is_live(front, now) {
                break;
            }
            self.buckets.pop_front();
        }

        let needs_new = self
            .buckets
            .back()
            .is_none_or(|b| now.saturating_duration_since(b.start) >= self.bucket_len);
        if needs_new {
            if self.buckets.len() == self.max_buckets {
                self.buckets.pop_front();
            }
            self.buckets.push_back(Bucket {
                start: now,
                successes: 0,
                failures: 0,
            });
        }

        // A bucket was either present or just pushed.
        let last = self.buckets.len() - 1;
        &mut self.buckets[last]
    }
}
