//! Key-value store trait with typed JSON helpers.

use crate::StoreError;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// Durable key-value storage.
///
/// The engine stores the serialized cart here so it survives app
/// restarts. Implementations wrap whatever the platform offers (device
/// storage, a remote session store); the in-memory backend in this crate
/// covers tests and development.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the raw string stored under a key, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store a raw string under a key, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key. Removing a missing key is a successful no-op.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Get a value and deserialize it from JSON.
///
/// Returns `None` if the key doesn't exist.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serialize a value to JSON and store it.
pub async fn set_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw).await
}
