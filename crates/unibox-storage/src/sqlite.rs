// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed [`KeyValueStore`].
//!
//! All statements run on tokio-rusqlite's single background thread, which
//! serializes writes. Values are stored as JSON text.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;
use tracing::debug;

use unibox_config::model::StorageConfig;
use unibox_core::{KeyValueStore, UniboxError};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);";

/// Convert a tokio-rusqlite error into `UniboxError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> UniboxError {
    UniboxError::Storage {
        source: Box::new(e),
    }
}

/// Persistent key-value store in a single SQLite table.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database described by `config`.
    pub async fn open(config: &StorageConfig) -> Result<Self, UniboxError> {
        let path = Path::new(&config.database_path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| UniboxError::Storage {
                    source: Box::new(e),
                })?;
            }
        }

        let conn = Connection::open(path)
            .await
            .map_err(|e| UniboxError::Storage {
                source: Box::new(e),
            })?;
        let store = Self { conn };
        store.init(config.wal_mode).await?;
        debug!(path = %config.database_path, wal = config.wal_mode, "sqlite store opened");
        Ok(store)
    }

    /// In-memory database, used by tests and dry runs.
    pub async fn open_in_memory() -> Result<Self, UniboxError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| UniboxError::Storage {
                source: Box::new(e),
            })?;
        let store = Self { conn };
        store.init(false).await?;
        Ok(store)
    }

    async fn init(&self, wal_mode: bool) -> Result<(), UniboxError> {
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                if wal_mode {
                    conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
                }
                conn.busy_timeout(Duration::from_secs(5))?;
                conn.execute_batch(SCHEMA)?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Keys currently stored, in lexical order.
    pub async fn keys(&self) -> Result<Vec<String>, UniboxError> {
        self.conn
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare("SELECT key FROM kv_store ORDER BY key")?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoint the WAL so the main database file is self-contained.
    pub async fn close(&self) -> Result<(), UniboxError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get_value(&self, key: &str) -> Result<Option<serde_json::Value>, UniboxError> {
        let key = key.to_string();
        let raw = self
            .conn
            .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
                conn.query_row(
                    "SELECT value FROM kv_store WHERE key = ?1",
                    rusqlite::params![key],
                    |row| row.get(0),
                )
                .optional()
            })
            .await
            .map_err(map_tr_err)?;

        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn save_value(&self, key: &str, value: serde_json::Value) -> Result<(), UniboxError> {
        let key = key.to_string();
        let text = serde_json::to_string(&value)?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                    updated_at = excluded.updated_at",
                    rusqlite::params![key, text, now],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use unibox_core::KeyValueStoreExt;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Token {
        access_token: String,
    }

    #[tokio::test]
    async fn missing_key_reads_none() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        assert!(store.get_value("auth_token:email").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_overwrites_previous_value() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        store.save_value("k", json!({"a": 1})).await.unwrap();
        store.save_value("k", json!({"a": 2})).await.unwrap();
        assert_eq!(store.get_value("k").await.unwrap(), Some(json!({"a": 2})));
        assert_eq!(store.keys().await.unwrap(), vec!["k".to_string()]);
    }

    #[tokio::test]
    async fn typed_helpers_round_trip() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let token = Token {
            access_token: "abc".into(),
        };
        store.save("auth_token:chat", &token).await.unwrap();
        let loaded: Option<Token> = store.get("auth_token:chat").await.unwrap();
        assert_eq!(loaded, Some(token));
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir
                .path()
                .join("nested")
                .join("unibox.db")
                .to_string_lossy()
                .into_owned(),
            wal_mode: true,
        };

        {
            let store = SqliteStore::open(&config).await.unwrap();
            store.save_value("user_mappings", json!([])).await.unwrap();
            store.close().await.unwrap();
        }

        let store = SqliteStore::open(&config).await.unwrap();
        assert_eq!(
            store.get_value("user_mappings").await.unwrap(),
            Some(json!([]))
        );
    }
}
