// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted user mappings.
//!
//! The whole list lives under one key. There is a single writer and the
//! last write wins.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use unibox_core::{
    ChannelIdentities, ChannelIdentity, KeyValueStore, KeyValueStoreExt, NewUserMapping,
    UniboxError, UserMapping,
};

/// Storage key of the mapping list.
pub const USER_MAPPINGS_KEY: &str = "user_mappings";

#[derive(Clone)]
pub struct MappingStore {
    store: Arc<dyn KeyValueStore>,
}

impl MappingStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// All mappings in stored (creation) order.
    pub async fn list(&self) -> Result<Vec<UserMapping>, UniboxError> {
        Ok(self
            .store
            .get::<Vec<UserMapping>>(USER_MAPPINGS_KEY)
            .await?
            .unwrap_or_default())
    }

    pub async fn get(&self, id: &str) -> Result<Option<UserMapping>, UniboxError> {
        Ok(self.list().await?.into_iter().find(|m| m.id == id))
    }

    /// Validate `new`, assign an id and timestamps, and append it.
    pub async fn create(&self, new: NewUserMapping) -> Result<UserMapping, UniboxError> {
        validate(&new)?;

        let now = Utc::now();
        let mapping = UserMapping {
            id: uuid::Uuid::new_v4().to_string(),
            display_name: new.display_name.trim().to_string(),
            identities: new.identities,
            priority: new.priority,
            tags: new.tags,
            created_at: now,
            updated_at: now,
        };

        let mut mappings = self.list().await?;
        mappings.push(mapping.clone());
        self.store.save(USER_MAPPINGS_KEY, &mappings).await?;

        info!(
            id = %mapping.id,
            name = %mapping.display_name,
            channels = ?mapping.identities.linked_channels(),
            "user mapping created"
        );
        Ok(mapping)
    }
}

fn validate(new: &NewUserMapping) -> Result<(), UniboxError> {
    if new.display_name.trim().is_empty() {
        return Err(UniboxError::InvalidInput(
            "display_name must not be empty".into(),
        ));
    }
    if new.identities.is_empty() {
        return Err(UniboxError::InvalidInput(
            "a mapping needs at least one channel identity".into(),
        ));
    }
    for channel in new.identities.linked_channels() {
        if let Some(identity) = new.identities.get(channel) {
            if is_blank(identity) {
                return Err(UniboxError::InvalidInput(format!(
                    "{channel} identity must not be blank"
                )));
            }
        }
    }
    Ok(())
}

fn is_blank(identity: ChannelIdentity<'_>) -> bool {
    match identity {
        ChannelIdentity::Email(e) => e.address.trim().is_empty(),
        ChannelIdentity::Chat(c) => {
            c.username.trim().is_empty()
                && c.user_id.as_deref().is_none_or(|id| id.trim().is_empty())
        }
        ChannelIdentity::Mobile(m) => m.phone.trim().is_empty(),
    }
}

/// Convenience for building identities from optional CLI-style inputs.
pub fn identities_from(
    email: Option<String>,
    chat: Option<String>,
    mobile: Option<String>,
) -> ChannelIdentities {
    ChannelIdentities {
        email: email.map(|address| unibox_core::EmailIdentity { address }),
        chat: chat.map(|username| unibox_core::ChatIdentity {
            username,
            user_id: None,
        }),
        mobile: mobile.map(|phone| unibox_core::MobileIdentity { phone }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unibox_core::{EmailIdentity, Priority};
    use unibox_storage::MemoryStore;

    fn store() -> MappingStore {
        MappingStore::new(Arc::new(MemoryStore::new()))
    }

    fn alice() -> NewUserMapping {
        NewUserMapping {
            display_name: " Alice ".into(),
            identities: identities_from(Some("alice@co.com".into()), Some("alice".into()), None),
            priority: Priority::High,
            tags: vec!["vip".into()],
        }
    }

    #[tokio::test]
    async fn create_assigns_id_and_persists_in_order() {
        let store = store();
        let first = store.create(alice()).await.unwrap();
        let mut bob = alice();
        bob.display_name = "Bob".into();
        let second = store.create(bob).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.display_name, "Alice");
        assert_eq!(first.created_at, first.updated_at);

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first.id);
        assert_eq!(store.get(&second.id).await.unwrap(), Some(second.clone()));
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_invalid_mappings() {
        let store = store();

        let mut nameless = alice();
        nameless.display_name = "  ".into();
        assert!(matches!(
            store.create(nameless).await,
            Err(UniboxError::InvalidInput(_))
        ));

        let mut unlinked = alice();
        unlinked.identities = ChannelIdentities::default();
        assert!(store.create(unlinked).await.is_err());

        let mut blank = alice();
        blank.identities.email = Some(EmailIdentity {
            address: " ".into(),
        });
        let err = store.create(blank).await.unwrap_err();
        assert!(err.to_string().contains("email identity"));

        assert!(store.list().await.unwrap().is_empty());
    }
}
