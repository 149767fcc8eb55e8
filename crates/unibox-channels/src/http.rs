// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared HTTP plumbing for the REST-backed clients.

use std::time::Duration;

use reqwest::{Response, Url};
use serde::de::DeserializeOwned;

use unibox_core::{ChannelType, UniboxError};

/// Build the pooled HTTP client for one channel.
///
/// The transport timeout is a backstop; the breaker's per-call timeout is
/// normally shorter.
pub(crate) fn build_client(channel: ChannelType) -> Result<reqwest::Client, UniboxError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .user_agent(concat!("unibox/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| UniboxError::Upstream {
            channel,
            message: format!("failed to build HTTP client: {e}"),
            status: None,
            source: Some(Box::new(e)),
        })
}

/// Join `segments` onto `base`, keeping any path `base` already has.
pub(crate) fn endpoint(
    channel: ChannelType,
    base: &str,
    segments: &[&str],
) -> Result<Url, UniboxError> {
    let mut url = Url::parse(base)
        .map_err(|e| UniboxError::Config(format!("invalid {channel} base_url `{base}`: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| UniboxError::Config(format!("{channel} base_url `{base}` cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub(crate) fn transport_error(channel: ChannelType, e: reqwest::Error) -> UniboxError {
    UniboxError::Upstream {
        channel,
        message: format!("HTTP request failed: {e}"),
        status: e.status().map(|s| s.as_u16()),
        source: Some(Box::new(e)),
    }
}

/// Decode a JSON body, turning non-2xx statuses into upstream errors.
pub(crate) async fn read_json<T: DeserializeOwned>(
    channel: ChannelType,
    response: Response,
) -> Result<T, UniboxError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(UniboxError::Upstream {
            channel,
            message: format!("API returned {status}: {}", truncate(&body, 200)),
            status: Some(status.as_u16()),
            source: None,
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|e| UniboxError::Upstream {
            channel,
            message: format!("failed to decode response: {e}"),
            status: Some(status.as_u16()),
            source: Some(Box::new(e)),
        })
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
