//! Design repository trait.

use async_trait::async_trait;

use super::document::DesignDocument;
use super::record::{DesignCatalog, DesignRecord, DesignSummary, StorageUsage};
use crate::error::Result;

/// Durable collection of named design records.
///
/// Read operations never fail: they degrade to empty or default results and
/// log the cause, so browsing designs never blocks the UI. Write operations
/// return an error whenever the change could not be persisted.
///
/// Every document returned is normalized.
#[async_trait]
pub trait DesignRepository: Send + Sync {
    /// Creates or replaces the record stored under `name`.
    ///
    /// `createdAt` is preserved for an existing name; `updatedAt` and
    /// `lastAutoSave` are set to now.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty name
    /// - `Persistence` when the store could not be written
    async fn save(&self, name: &str, design: DesignDocument) -> Result<()>;

    /// Returns every record, migrating legacy entries on the fly.
    async fn get_all(&self) -> DesignCatalog;

    /// Returns the document stored under `name`.
    async fn get(&self, name: &str) -> Option<DesignDocument>;

    /// Returns the full record stored under `name`.
    async fn get_record(&self, name: &str) -> Option<DesignRecord>;

    /// Removes `name` if present. Deleting a missing name succeeds.
    async fn delete(&self, name: &str) -> Result<()>;

    async fn exists(&self, name: &str) -> bool;

    /// Moves a record to a new name.
    ///
    /// # Errors
    ///
    /// - `Conflict` if `new_name` is taken (checked first)
    /// - `NotFound` if `old_name` does not exist
    async fn rename(&self, old_name: &str, new_name: &str) -> Result<()>;

    /// Copies a record under a free name and returns that name.
    ///
    /// # Errors
    ///
    /// - `NotFound` if `original_name` does not exist
    async fn duplicate(&self, original_name: &str, desired_name: Option<&str>) -> Result<String>;

    /// Serializes the whole store as pretty-printed JSON.
    async fn export_all(&self) -> Result<String>;

    /// Merges an exported store into this one and returns the names written.
    ///
    /// Name clashes are resolved with a numeric suffix. Either every record
    /// is merged or nothing is persisted.
    ///
    /// # Errors
    ///
    /// - `Import` when the payload is not an exported store
    /// - `Persistence` when the merged store could not be written
    async fn import_all(&self, blob: &str) -> Result<Vec<String>>;

    async fn usage(&self) -> StorageUsage;

    /// Records whose name contains `query`, ignoring case.
    async fn search(&self, query: &str) -> DesignCatalog;

    async fn count(&self) -> usize;

    /// Summaries ordered by most recently updated first.
    async fn list_summaries(&self) -> Vec<DesignSummary>;

    /// Removes every record and every autosave slot.
    async fn clear_all(&self) -> Result<()>;
}
