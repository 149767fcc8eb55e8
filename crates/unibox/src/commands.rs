// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand handlers. Each returns the text to print on stdout.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tracing::info;

use unibox_channels::AuthToken;
use unibox_core::{ChannelType, NewUserMapping, Priority, SendMessageParams, UniboxError};
use unibox_inbox::{identities_from, Origin};
use unibox_prometheus::PrometheusExporter;

use crate::app::App;
use crate::render;

/// Output switches shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
    pub color: bool,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, UniboxError> {
    Ok(format!("{}\n", serde_json::to_string_pretty(value)?))
}

pub async fn inbox(
    app: &App,
    output: Output,
    show_breakers: bool,
    metrics: bool,
) -> Result<String, UniboxError> {
    let exporter = if metrics {
        Some(PrometheusExporter::install()?)
    } else {
        None
    };

    let inbox = app.inbox();
    let result = inbox.fetch_all().await;

    let mut out = if output.json {
        to_json(&result)?
    } else {
        render::aggregation(&result, output.color)
    };
    if show_breakers && !output.json {
        out.push('\n');
        out.push_str(&render::breakers(&inbox.breaker_snapshots(), output.color));
    }
    if let Some(exporter) = exporter {
        out.push('\n');
        out.push_str(&exporter.render());
    }
    Ok(out)
}

pub async fn related(
    app: &App,
    output: Output,
    user_id: &str,
    channel: ChannelType,
    message_id: &str,
) -> Result<String, UniboxError> {
    let origin = Origin {
        channel,
        id: message_id,
    };
    let messages = app.gatherer().related_messages(user_id, origin).await;
    if output.json {
        to_json(&messages)
    } else {
        Ok(render::messages(&messages))
    }
}

pub async fn send(
    app: &App,
    output: Output,
    channel: ChannelType,
    params: SendMessageParams,
) -> Result<String, UniboxError> {
    let receipt = app.inbox().send(channel, params).await?;
    info!(%channel, id = %receipt.id.0, "message sent");
    if output.json {
        to_json(&receipt)
    } else {
        Ok(format!("sent via {} (id {})\n", receipt.channel, receipt.id.0))
    }
}

/// Arguments of `mapping create`.
#[derive(Debug, Clone, Default)]
pub struct MappingArgs {
    pub name: String,
    pub email: Option<String>,
    pub chat: Option<String>,
    pub mobile: Option<String>,
    pub priority: Priority,
    pub tags: Vec<String>,
}

pub async fn mapping_create(
    app: &App,
    output: Output,
    args: MappingArgs,
) -> Result<String, UniboxError> {
    let created = app
        .mappings()
        .create(NewUserMapping {
            display_name: args.name,
            identities: identities_from(args.email, args.chat, args.mobile),
            priority: args.priority,
            tags: args.tags,
        })
        .await?;
    if output.json {
        to_json(&created)
    } else {
        Ok(format!("created {} ({})\n", created.display_name, created.id))
    }
}

pub async fn mapping_list(app: &App, output: Output) -> Result<String, UniboxError> {
    let mappings = app.mappings().list().await?;
    if output.json {
        to_json(&mappings)
    } else {
        Ok(render::mappings(&mappings))
    }
}

pub async fn token_set(
    app: &App,
    channel: ChannelType,
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
) -> Result<String, UniboxError> {
    let token = AuthToken {
        access_token,
        expires_at,
    };
    if !token.is_usable(Utc::now()) {
        return Err(UniboxError::InvalidInput(
            "token is empty or already expired".to_string(),
        ));
    }
    app.tokens().set(channel, &token).await?;
    Ok(format!("stored {channel} token\n"))
}

/// Ingest a mobile webhook payload from `source` (`-` reads stdin).
pub async fn webhook_mobile(app: &App, source: &Path) -> Result<String, UniboxError> {
    let body = if source == Path::new("-") {
        let mut body = String::new();
        tokio::io::stdin()
            .read_to_string(&mut body)
            .await
            .map_err(|e| UniboxError::InvalidInput(format!("failed to read stdin: {e}")))?;
        body
    } else {
        tokio::fs::read_to_string(source).await.map_err(|e| {
            UniboxError::InvalidInput(format!("failed to read {}: {e}", source.display()))
        })?
    };
    let payload: serde_json::Value = serde_json::from_str(&body)?;
    let added = app.mobile_inbox().ingest(&payload).await?;
    Ok(format!("buffered {added} new mobile message(s)\n"))
}
