// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unibox - one inbox over email, chat and mobile messaging.
//!
//! This is the binary entry point.

mod app;
mod commands;
mod render;

use std::io::IsTerminal;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use unibox_config::UniboxConfig;
use unibox_core::{ChannelType, Priority, SendMessageParams, UniboxError};

use crate::app::App;
use crate::commands::{MappingArgs, Output};

/// Unibox - one inbox over email, chat and mobile messaging.
#[derive(Parser, Debug)]
#[command(name = "unibox", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch unread messages from every channel.
    Inbox {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Show circuit breaker state per channel.
        #[arg(long)]
        breakers: bool,
        /// Append Prometheus metrics for this run.
        #[arg(long)]
        metrics: bool,
    },
    /// Recent messages from one person across their linked channels.
    Related {
        /// User mapping id.
        user_id: String,
        /// Channel of the message being replied to.
        #[arg(long)]
        channel: ChannelType,
        /// Id of the message being replied to; excluded from the output.
        #[arg(long)]
        message_id: String,
        #[arg(long)]
        json: bool,
    },
    /// Send a message through one channel.
    Send {
        #[arg(long)]
        channel: ChannelType,
        /// Recipient address, username or phone id.
        #[arg(long)]
        to: String,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        reply_to: Option<String>,
        #[arg(long)]
        thread: Option<String>,
        #[arg(long)]
        json: bool,
        /// Message body.
        content: String,
    },
    /// Manage user mappings.
    Mapping {
        #[command(subcommand)]
        action: MappingCommand,
    },
    /// Manage channel access tokens.
    Token {
        #[command(subcommand)]
        action: TokenCommand,
    },
    /// Ingest inbound webhook payloads.
    Webhook {
        #[command(subcommand)]
        action: WebhookCommand,
    },
}

#[derive(Subcommand, Debug)]
enum MappingCommand {
    /// Link a person's identities across channels.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        chat: Option<String>,
        #[arg(long)]
        mobile: Option<String>,
        #[arg(long, default_value = "normal")]
        priority: Priority,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// List every user mapping.
    List {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Store the access token for a channel.
    Set {
        channel: ChannelType,
        token: String,
        /// RFC 3339 expiry, e.g. 2026-12-31T00:00:00Z.
        #[arg(long)]
        expires_at: Option<DateTime<Utc>>,
    },
}

#[derive(Subcommand, Debug)]
enum WebhookCommand {
    /// Buffer messages from a mobile webhook payload (`-` for stdin).
    Mobile { file: PathBuf },
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("unibox={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> UniboxConfig {
    let loaded = match path {
        Some(path) => unibox_config::load_and_validate_path(path),
        None => unibox_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            unibox_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

async fn run(command: Commands, app: &App, color: bool) -> Result<String, UniboxError> {
    let output = |json| Output { json, color };
    match command {
        Commands::Inbox {
            json,
            breakers,
            metrics,
        } => commands::inbox(app, output(json), breakers, metrics).await,
        Commands::Related {
            user_id,
            channel,
            message_id,
            json,
        } => commands::related(app, output(json), &user_id, channel, &message_id).await,
        Commands::Send {
            channel,
            to,
            subject,
            reply_to,
            thread,
            json,
            content,
        } => {
            let params = SendMessageParams {
                subject,
                thread_id: thread,
                reply_to_id: reply_to,
                ..SendMessageParams::new(to, content)
            };
            commands::send(app, output(json), channel, params).await
        }
        Commands::Mapping {
            action:
                MappingCommand::Create {
                    name,
                    email,
                    chat,
                    mobile,
                    priority,
                    tags,
                    json,
                },
        } => {
            let args = MappingArgs {
                name,
                email,
                chat,
                mobile,
                priority,
                tags,
            };
            commands::mapping_create(app, output(json), args).await
        }
        Commands::Mapping {
            action: MappingCommand::List { json },
        } => commands::mapping_list(app, output(json)).await,
        Commands::Token {
            action:
                TokenCommand::Set {
                    channel,
                    token,
                    expires_at,
                },
        } => commands::token_set(app, channel, token, expires_at).await,
        Commands::Webhook {
            action: WebhookCommand::Mobile { file },
        } => commands::webhook_mobile(app, &file).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref());
    init_tracing(&config.inbox.log_level);

    let color = !cli.plain && std::io::stdout().is_terminal();
    let app = match App::open(config).await {
        Ok(app) => app,
        Err(e) => {
            eprintln!("unibox: {e}");
            std::process::exit(1);
        }
    };

    match run(cli.command, &app, color).await {
        Ok(out) => print!("{out}"),
        Err(e) => {
            eprintln!("unibox: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn binary_loads_config_defaults() {
        let config = unibox_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.inbox.fetch_limit, 50);
        assert_eq!(config.related.lookback_days, 7);
    }

    #[test]
    #[serial]
    fn env_override_reaches_loaded_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unibox.toml");
        std::fs::write(&path, "[inbox]\nfetch_limit = 20\n").unwrap();

        // SAFETY: test-only env mutation. Tests using env vars run serially.
        unsafe { std::env::set_var("UNIBOX_RELATED_LOOKBACK_DAYS", "3") };
        let result = unibox_config::load_and_validate_path(&path);
        unsafe { std::env::remove_var("UNIBOX_RELATED_LOOKBACK_DAYS") };

        let config = result.expect("config should load");
        assert_eq!(config.inbox.fetch_limit, 20);
        assert_eq!(config.related.lookback_days, 3);
    }

    #[test]
    fn parses_send_with_optional_fields() {
        let cli = Cli::try_parse_from([
            "unibox",
            "send",
            "--channel",
            "Email",
            "--to",
            "bob@co.com",
            "--subject",
            "Re: plan",
            "--reply-to",
            "m1",
            "see you then",
        ])
        .unwrap();
        match cli.command {
            Commands::Send {
                channel,
                to,
                subject,
                reply_to,
                thread,
                content,
                ..
            } => {
                assert_eq!(channel, ChannelType::Email);
                assert_eq!(to, "bob@co.com");
                assert_eq!(subject.as_deref(), Some("Re: plan"));
                assert_eq!(reply_to.as_deref(), Some("m1"));
                assert!(thread.is_none());
                assert_eq!(content, "see you then");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_mapping_create_with_tags_and_priority() {
        let cli = Cli::try_parse_from([
            "unibox",
            "--plain",
            "mapping",
            "create",
            "--name",
            "Alice",
            "--chat",
            "alice",
            "--priority",
            "urgent",
            "--tag",
            "exec",
            "--tag",
            "board",
        ])
        .unwrap();
        assert!(cli.plain);
        match cli.command {
            Commands::Mapping {
                action:
                    MappingCommand::Create {
                        priority, tags, ..
                    },
            } => {
                assert_eq!(priority, Priority::Urgent);
                assert_eq!(tags, vec!["exec", "board"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_channel() {
        assert!(
            Cli::try_parse_from(["unibox", "token", "set", "fax", "tok"]).is_err()
        );
    }

    #[test]
    fn token_expiry_parses_rfc3339() {
        let cli = Cli::try_parse_from([
            "unibox",
            "token",
            "set",
            "mobile",
            "tok",
            "--expires-at",
            "2026-12-31T00:00:00Z",
        ])
        .unwrap();
        match cli.command {
            Commands::Token {
                action: TokenCommand::Set { expires_at, .. },
            } => assert!(expires_at.is_some()),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
