// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human-readable output for the CLI.

use colored::Colorize;

use unibox_core::{BreakerSnapshot, CircuitState, Message, Priority, UserMapping};
use unibox_inbox::{AggregationResult, ResolvedMessage};

const PREVIEW_CHARS: usize = 60;

fn preview(content: &str) -> String {
    let line = content.lines().next().unwrap_or_default();
    if line.chars().count() > PREVIEW_CHARS {
        let cut: String = line.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}…")
    } else {
        line.to_string()
    }
}

fn priority_label(priority: Priority, color: bool) -> String {
    let label = format!("{:>6}", priority.to_string());
    if !color {
        return label;
    }
    match priority {
        Priority::Urgent => label.red().bold().to_string(),
        Priority::High => label.yellow().to_string(),
        Priority::Normal => label,
        Priority::Low => label.dimmed().to_string(),
    }
}

fn sender(message: &ResolvedMessage) -> String {
    match &message.user {
        Some(user) => format!("{} ({})", user.display_name, message.message.from),
        None => message.message.from.clone(),
    }
}

pub fn aggregation(result: &AggregationResult, color: bool) -> String {
    let mut out = String::new();

    for channel in result.channel_results.values() {
        let status = match (&channel.error, color) {
            (None, true) => "✓".green().to_string(),
            (None, false) => "ok".to_string(),
            (Some(_), true) => "✗".red().to_string(),
            (Some(_), false) => "failed".to_string(),
        };
        out.push_str(&format!(
            "  {status} {:<10} {:>3} message(s)",
            channel.name, channel.message_count
        ));
        if let Some(error) = &channel.error {
            out.push_str(&format!("  {error}"));
        }
        out.push('\n');
    }
    out.push('\n');

    if result.messages.is_empty() {
        out.push_str("  No unread messages.\n");
        return out;
    }

    for message in &result.messages {
        let subject = message
            .message
            .subject
            .as_deref()
            .map(|s| format!("[{s}] "))
            .unwrap_or_default();
        out.push_str(&format!(
            "  {} {:<6} {}  {}\n      {subject}{}\n",
            priority_label(message.priority, color),
            message.message.channel.to_string(),
            message.message.timestamp.format("%Y-%m-%d %H:%M"),
            sender(message),
            preview(&message.message.content),
        ));
    }
    out.push_str(&format!("\n  {} unread message(s)\n", result.total_count));
    out
}

pub fn messages(messages: &[Message]) -> String {
    if messages.is_empty() {
        return "  No related messages.\n".to_string();
    }
    messages
        .iter()
        .map(|m| {
            format!(
                "  {:<6} {}  {}: {}\n",
                m.channel.to_string(),
                m.timestamp.format("%Y-%m-%d %H:%M"),
                m.from,
                preview(&m.content)
            )
        })
        .collect()
}

pub fn mappings(mappings: &[UserMapping]) -> String {
    if mappings.is_empty() {
        return "  No user mappings.\n".to_string();
    }
    mappings
        .iter()
        .map(|m| {
            let channels: Vec<String> = m
                .identities
                .linked_channels()
                .iter()
                .map(ToString::to_string)
                .collect();
            format!(
                "  {}  {:<20} {:<7} {}\n",
                m.id,
                m.display_name,
                m.priority.to_string(),
                channels.join(",")
            )
        })
        .collect()
}

pub fn breakers(snapshots: &[BreakerSnapshot], color: bool) -> String {
    snapshots
        .iter()
        .map(|s| {
            let state = s.state.to_string();
            let state = match (s.state, color) {
                (CircuitState::Open, true) => state.red().to_string(),
                (CircuitState::HalfOpen, true) => state.yellow().to_string(),
                _ => state,
            };
            format!(
                "  breaker {:<8} {state:<9} window {}/{} failed, {} rejected\n",
                s.name, s.window_failures, s.window_calls, s.rejects
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use unibox_core::ChannelType;
    use unibox_inbox::{resolve, ChannelResult};
    use unibox_test_utils::fixtures::{base_time, mapping, message};

    #[test]
    fn preview_truncates_long_first_line() {
        let long = "x".repeat(100);
        assert_eq!(preview(&long).chars().count(), PREVIEW_CHARS + 1);
        assert_eq!(preview("first\nsecond"), "first");
    }

    #[test]
    fn aggregation_lists_channels_and_people() {
        let alice = mapping("u1", "Alice", Priority::Urgent);
        let messages = resolve(
            &[alice],
            vec![message(ChannelType::Email, "m1", "alice@co.com", 0)],
        );
        let mut channel_results = BTreeMap::new();
        channel_results.insert(
            "email".to_string(),
            ChannelResult {
                name: "email".into(),
                channel: ChannelType::Email,
                success: true,
                message_count: 1,
                error: None,
            },
        );
        channel_results.insert(
            "chat".to_string(),
            ChannelResult {
                name: "chat".into(),
                channel: ChannelType::Chat,
                success: false,
                message_count: 0,
                error: Some("Not authenticated".into()),
            },
        );
        let result = AggregationResult {
            success: true,
            messages,
            channel_results,
            total_count: 1,
            timestamp: base_time(),
        };

        let text = aggregation(&result, false);
        assert!(text.contains("failed chat"), "{text}");
        assert!(text.contains("Not authenticated"));
        assert!(text.contains("Alice (alice@co.com)"));
        assert!(text.contains("urgent"));
        assert!(text.contains("1 unread message(s)"));
    }
}
