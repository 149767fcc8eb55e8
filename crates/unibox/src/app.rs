// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring of storage, channel clients and the inbox from configuration.

use std::sync::Arc;

use unibox_channels::{MobileInbox, TokenStore};
use unibox_config::UniboxConfig;
use unibox_core::{ChannelClient, KeyValueStore, UniboxError};
use unibox_inbox::{MappingStore, RelatedMessageGatherer, UnifiedInbox};
use unibox_storage::SqliteStore;

/// Everything a command needs, built once per invocation.
pub struct App {
    config: UniboxConfig,
    store: Arc<dyn KeyValueStore>,
    clients: Vec<Arc<dyn ChannelClient>>,
}

impl App {
    /// Open the configured SQLite store and build every channel client.
    pub async fn open(config: UniboxConfig) -> Result<Self, UniboxError> {
        let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&config.storage).await?);
        Self::with_store(config, store)
    }

    pub fn with_store(
        config: UniboxConfig,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, UniboxError> {
        let clients = unibox_channels::build_clients(&config, store.clone())?;
        Ok(Self {
            config,
            store,
            clients,
        })
    }

    pub fn mappings(&self) -> MappingStore {
        MappingStore::new(self.store.clone())
    }

    pub fn tokens(&self) -> TokenStore {
        TokenStore::new(self.store.clone())
    }

    pub fn mobile_inbox(&self) -> MobileInbox {
        MobileInbox::new(self.store.clone())
    }

    pub fn inbox(&self) -> UnifiedInbox {
        UnifiedInbox::new(self.clients.clone(), self.mappings(), &self.config.inbox)
    }

    pub fn gatherer(&self) -> RelatedMessageGatherer {
        RelatedMessageGatherer::new(self.clients.clone(), self.mappings(), &self.config.related)
    }
}
