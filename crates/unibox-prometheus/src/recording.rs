// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics. With no recorder installed every call is a no-op.

use metrics::{describe_counter, describe_histogram};

/// Register all Unibox metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "unibox_breaker_events_total",
        "Circuit breaker outcomes and transitions"
    );
    describe_counter!(
        "unibox_channel_fetch_total",
        "Per-channel fetch attempts by outcome"
    );
    describe_histogram!(
        "unibox_channel_fetch_seconds",
        "Per-channel fetch latency in seconds"
    );
    describe_counter!(
        "unibox_aggregation_cycles_total",
        "Unified inbox aggregation cycles"
    );
    describe_counter!(
        "unibox_messages_fetched_total",
        "Messages returned by channel fetches"
    );
    describe_counter!(
        "unibox_messages_resolved_total",
        "Messages by identity resolution outcome"
    );
}

/// Record a breaker notification (`open`, `success`, `reject`, ...).
pub fn record_breaker_event(breaker: &str, event: &'static str) {
    metrics::counter!(
        "unibox_breaker_events_total",
        "breaker" => breaker.to_string(),
        "event" => event
    )
    .increment(1);
}

/// Record one channel's outcome within an aggregation cycle.
///
/// `outcome` is `ok`, `unauthenticated` or `error`.
pub fn record_channel_fetch(channel: &str, outcome: &'static str, count: usize, seconds: f64) {
    metrics::counter!(
        "unibox_channel_fetch_total",
        "channel" => channel.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::counter!("unibox_messages_fetched_total", "channel" => channel.to_string())
        .increment(count as u64);
    metrics::histogram!("unibox_channel_fetch_seconds", "channel" => channel.to_string())
        .record(seconds);
}

/// Record a completed aggregation cycle.
pub fn record_aggregation_cycle() {
    metrics::counter!("unibox_aggregation_cycles_total").increment(1);
}

/// Record identity resolution results for one batch.
pub fn record_resolution(resolved: usize, unresolved: usize) {
    metrics::counter!("unibox_messages_resolved_total", "outcome" => "resolved")
        .increment(resolved as u64);
    metrics::counter!("unibox_messages_resolved_total", "outcome" => "unresolved")
        .increment(unresolved as u64);
}
