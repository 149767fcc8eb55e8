// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message and mapping fixtures.

use chrono::{DateTime, Duration, TimeZone, Utc};

use unibox_core::{
    ChannelIdentities, ChannelType, ChatIdentity, EmailIdentity, Message, MobileIdentity,
    Priority, UserMapping,
};

/// Fixed reference instant all fixtures are relative to.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Unread message `minutes` after [`base_time`].
pub fn message(channel: ChannelType, id: &str, from: &str, minutes: i64) -> Message {
    Message {
        id: id.to_string(),
        channel,
        from: from.to_string(),
        to: "me".to_string(),
        content: format!("content of {id}"),
        subject: None,
        timestamp: base_time() + Duration::minutes(minutes),
        is_unread: true,
        thread_id: None,
        reply_to_id: None,
    }
}

/// Mapping for a person reachable on all three channels.
pub fn mapping(id: &str, name: &str, priority: Priority) -> UserMapping {
    let slug = name.to_lowercase().replace(' ', ".");
    UserMapping {
        id: id.to_string(),
        display_name: name.to_string(),
        identities: ChannelIdentities {
            email: Some(EmailIdentity {
                address: format!("{slug}@co.com"),
            }),
            chat: Some(ChatIdentity {
                username: slug.clone(),
                user_id: None,
            }),
            mobile: Some(MobileIdentity {
                phone: format!("1555-{id}"),
            }),
        },
        priority,
        tags: Vec::new(),
        created_at: base_time(),
        updated_at: base_time(),
    }
}
