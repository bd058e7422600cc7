//! Local key-value storage for shopper state.
//!
//! Every state container mirrors itself into a [`KeyValueStore`] after each
//! mutation and reloads from it at start-up. Values are JSON documents stored
//! under the keys in [`keys`].
//!
//! # Backends
//!
//! - [`FileStore`] - one JSON file per key in the data directory
//! - [`MemoryStore`] - process-local map (tests, throwaway sessions)
//!
//! There is no schema versioning: a value that no longer deserializes is
//! discarded and the container starts empty.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Storage keys for persisted shopper state.
pub mod keys {
    /// Cart items, as a flat list.
    pub const CART: &str = "kiosk-cart";

    /// Favorite items, as a flat list.
    pub const FAVORITES: &str = "kiosk-favorites";

    /// The signed-in (simulated) user.
    pub const USER: &str = "kiosk-user";

    /// The most recently placed order.
    pub const LAST_ORDER: &str = "lastOrder";
}

/// Errors that can occur when reading or writing the store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error on key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Value could not be serialized.
    #[error("serialization error on key {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Key contains characters that are not allowed.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// A string-valued key-value store.
///
/// Writes replace the whole value. Implementations must be safe to share
/// between request handlers.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Load and deserialize the value under `key`.
///
/// A value that fails to deserialize is removed from the store and treated
/// as absent. Read errors are logged and also treated as absent.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read persisted state");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Discarding malformed persisted state");
            if let Err(e) = store.remove(key) {
                tracing::warn!(key, error = %e, "Failed to remove malformed persisted state");
            }
            None
        }
    }
}

/// Serialize `value` and store it under `key`.
///
/// # Errors
///
/// Returns `StorageError` if serialization or the write fails.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw)
}

/// Store `value` under `key`, logging instead of failing.
///
/// State containers use this: persistence is fire-and-forget and a failed
/// write never fails the in-memory mutation.
pub fn mirror_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) {
    if let Err(e) = save_json(store, key, value) {
        tracing::warn!(key, error = %e, "Failed to persist state");
    }
}

/// Remove `key`, logging instead of failing.
pub fn forget(store: &dyn KeyValueStore, key: &str) {
    if let Err(e) = store.remove(key) {
        tracing::warn!(key, error = %e, "Failed to remove persisted state");
    }
}
