// SPDX-FileCopyrightText: 2026 Unibox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value storage trait for persisted JSON blobs.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::UniboxError;

/// An opaque, non-transactional key to JSON value store.
///
/// Writers are assumed to be single and last-write-wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Returns the value stored under `key`, if any.
    async fn get_value(&self, key: &str) -> Result<Option<serde_json::Value>, UniboxError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn save_value(&self, key: &str, value: serde_json::Value) -> Result<(), UniboxError>;
}

/// Typed helpers over [`KeyValueStore`].
///
/// Kept off the trait so the trait stays object safe.
#[async_trait]
pub trait KeyValueStoreExt: KeyValueStore {
    /// Reads and deserializes the value under `key`.
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, UniboxError> {
        match self.get_value(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Serializes and stores `value` under `key`.
    async fn save<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), UniboxError> {
        let value = serde_json::to_value(value)?;
        self.save_value(key, value).await
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}
