//! Autosave slot repository backed by a key-value store.
//!
//! Each slot is stored under `"<prefix>_<designId>"` (or `"<prefix>_new"`)
//! beside the design collection.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use version_migrate::Migrator;

use designhub_core::DesignError;
use designhub_core::autosave::{AutoSaveKey, AutoSaveRepository, AutoSaveSnapshot};
use designhub_core::clock::{Clock, SystemClock};
use designhub_core::config::DEFAULT_AUTOSAVE_PREFIX;
use designhub_core::design::DesignDocument;
use designhub_core::error::Result;
use designhub_core::storage::KeyValueStore;

use crate::dto::{AUTOSAVE_ENTITY, LegacyAutoSaveSlot, create_autosave_migrator};

pub struct KvAutoSaveRepository {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
    clock: Arc<dyn Clock>,
    migrator: Migrator,
}

impl KvAutoSaveRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_prefix(store, DEFAULT_AUTOSAVE_PREFIX)
    }

    pub fn with_prefix(store: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            clock: Arc::new(SystemClock),
            migrator: create_autosave_migrator(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn decode(&self, raw: &str) -> Option<AutoSaveSnapshot> {
        let value: Value = serde_json::from_str(raw).ok()?;

        if value.get("version").is_some() {
            return self
                .migrator
                .load_flat_from(AUTOSAVE_ENTITY, value)
                .inspect_err(|e| tracing::warn!(error = %e, "Failed to migrate autosave slot"))
                .ok();
        }

        LegacyAutoSaveSlot::from_value(value)
    }
}

#[async_trait]
impl AutoSaveRepository for KvAutoSaveRepository {
    async fn load(&self, key: &AutoSaveKey) -> Option<AutoSaveSnapshot> {
        let storage_key = key.storage_key(&self.prefix);
        let raw = match self.store.get(&storage_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %storage_key, error = %e, "Failed to read autosave slot");
                return None;
            }
        };

        let snapshot = self.decode(&raw);
        if snapshot.is_none() {
            tracing::warn!(key = %storage_key, "Ignoring unreadable autosave slot");
        }
        snapshot
    }

    async fn save(&self, key: &AutoSaveKey, document: DesignDocument) -> Result<()> {
        let storage_key = key.storage_key(&self.prefix);
        let snapshot = AutoSaveSnapshot {
            document,
            timestamp: self.clock.now_millis(),
        };

        let serialized = self
            .migrator
            .save_domain_flat(AUTOSAVE_ENTITY, snapshot)
            .map_err(|e| DesignError::persistence(format!("Failed to serialize autosave: {}", e)))?;

        self.store
            .set(&storage_key, &serialized)
            .await
            .map_err(|e| DesignError::persistence(format!("Failed to write autosave: {}", e)))?;

        tracing::debug!(key = %storage_key, "Autosave written");
        Ok(())
    }

    async fn clear(&self, key: &AutoSaveKey) -> Result<()> {
        let storage_key = key.storage_key(&self.prefix);
        self.store.remove(&storage_key).await?;
        tracing::debug!(key = %storage_key, "Autosave cleared");
        Ok(())
    }
}
