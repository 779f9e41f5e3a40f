//! Key-value storage abstraction.
//!
//! Designs and autosave slots are persisted as serialized strings under
//! string keys, the way a browser's local storage works. Implementations
//! live in the infrastructure crate.

use async_trait::async_trait;

use crate::error::Result;

/// A flat string-to-string store.
///
/// There is no partial update and no locking across calls: callers do
/// read-modify-write on whole values, so two writers interleaving on the same
/// key can lose one writer's changes.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` when the value cannot be stored (e.g. quota
    /// exceeded).
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Lists every stored key.
    async fn keys(&self) -> Result<Vec<String>>;
}
