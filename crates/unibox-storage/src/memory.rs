// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-local [`KeyValueStore`].

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use unibox_core::{KeyValueStore, UniboxError};

/// Keeps values in a map; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_value(&self, key: &str) -> Result<Option<serde_json::Value>, UniboxError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn save_value(&self, key: &str, value: serde_json::Value) -> Result<(), UniboxError> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn last_write_wins() {
        let store = MemoryStore::new();
        assert!(store.is_empty().await);
        store.save_value("a", json!(1)).await.unwrap();
        store.save_value("a", json!(2)).await.unwrap();
        assert_eq!(store.get_value("a").await.unwrap(), Some(json!(2)));
        assert_eq!(store.len().await, 1);
    }
}
