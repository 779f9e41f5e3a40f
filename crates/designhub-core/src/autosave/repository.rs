//! Autosave slot repository trait.

use async_trait::async_trait;

use super::model::{AutoSaveKey, AutoSaveSnapshot};
use crate::design::DesignDocument;
use crate::error::Result;

/// Temporary per-session storage for in-progress edits.
///
/// Slots live beside the named design collection and are never listed as
/// designs.
#[async_trait]
pub trait AutoSaveRepository: Send + Sync {
    /// Loads the slot for `key`. Missing or unreadable slots yield `None`.
    async fn load(&self, key: &AutoSaveKey) -> Option<AutoSaveSnapshot>;

    /// Overwrites the slot for `key` with `document`, stamped now.
    async fn save(&self, key: &AutoSaveKey, document: DesignDocument) -> Result<()>;

    /// Removes the slot for `key`. Clearing a missing slot succeeds.
    async fn clear(&self, key: &AutoSaveKey) -> Result<()>;
}
