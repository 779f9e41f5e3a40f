//! Design repository backed by a key-value store.
//!
//! The whole collection lives as one JSON object under a single store key.
//! Every mutation reads the full collection, edits it in memory and writes
//! the full collection back; there is no partial update.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use designhub_core::DesignError;
use designhub_core::clock::{Clock, SystemClock};
use designhub_core::config::StorageConfig;
use designhub_core::design::{
    DesignCatalog, DesignDocument, DesignRecord, DesignRepository, DesignSummary, StorageUsage,
    duplicate_name, newest_first, normalize, unique_name,
};
use designhub_core::error::Result;
use designhub_core::storage::KeyValueStore;

use crate::dto::{StoredDesignRecord, StoredEntryShape};

const ENTITY: &str = "design";

/// Store-backed implementation of [`DesignRepository`].
pub struct KvDesignRepository {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    store_key: String,
    autosave_prefix: String,
    capacity_bytes: u64,
}

impl KvDesignRepository {
    /// Creates a repository with default keys and the system clock.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_config(store, &StorageConfig::default())
    }

    pub fn with_config(store: Arc<dyn KeyValueStore>, config: &StorageConfig) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            store_key: config.store_key.clone(),
            autosave_prefix: config.autosave_prefix.clone(),
            capacity_bytes: config.capacity_bytes,
        }
    }

    /// Replaces the clock used for timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Reads and parses the full collection.
    ///
    /// A missing store is an empty collection. Unreadable or unparsable
    /// stores are errors; read paths swallow them, write paths refuse to
    /// overwrite what they could not read.
    async fn load_catalog(&self) -> Result<DesignCatalog> {
        let raw = match self.store.get(&self.store_key).await? {
            Some(raw) => raw,
            None => return Ok(BTreeMap::new()),
        };

        let entries: Map<String, Value> = serde_json::from_str(&raw)?;
        let now = self.clock.now_millis();

        let catalog = entries
            .into_iter()
            .map(|(name, entry)| {
                let (record, shape) = StoredDesignRecord::into_record(name.clone(), entry, now);
                if shape != StoredEntryShape::Current {
                    tracing::debug!(name = %name, shape = ?shape, "Migrated legacy design entry");
                }
                (name, record)
            })
            .collect();

        Ok(catalog)
    }

    async fn load_catalog_for_write(&self) -> Result<DesignCatalog> {
        self.load_catalog().await.map_err(|e| {
            DesignError::persistence(format!("Failed to read stored designs: {}", e))
        })
    }

    async fn write_catalog(&self, catalog: &DesignCatalog) -> Result<()> {
        let serialized = serde_json::to_string(catalog)?;
        self.store
            .set(&self.store_key, &serialized)
            .await
            .map_err(|e| match e {
                DesignError::Persistence(_) => e,
                other => DesignError::persistence(other.to_string()),
            })
    }

    fn autosave_key_prefix(&self) -> String {
        format!("{}_", self.autosave_prefix)
    }
}

#[async_trait]
impl DesignRepository for KvDesignRepository {
    async fn save(&self, name: &str, design: DesignDocument) -> Result<()> {
        if name.trim().is_empty() {
            return Err(DesignError::validation("Design name must not be empty"));
        }

        let mut catalog = self.load_catalog_for_write().await?;
        let now = self.clock.now_millis();
        let created_at = catalog.get(name).map(|r| r.created_at).unwrap_or(now);

        catalog.insert(
            name.to_string(),
            DesignRecord {
                name: name.to_string(),
                design: normalize(Some(design.into_value())),
                created_at,
                updated_at: now,
                last_auto_save: Some(now),
            },
        );

        self.write_catalog(&catalog).await.inspect_err(|e| {
            tracing::error!(name, error = %e, "Failed to save design");
        })?;

        tracing::info!(name, "Design saved");
        Ok(())
    }

    async fn get_all(&self) -> DesignCatalog {
        match self.load_catalog().await {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::error!(store_key = %self.store_key, error = %e, "Failed to load designs");
                BTreeMap::new()
            }
        }
    }

    async fn get(&self, name: &str) -> Option<DesignDocument> {
        self.get_record(name).await.map(|record| record.design)
    }

    async fn get_record(&self, name: &str) -> Option<DesignRecord> {
        self.get_all().await.remove(name)
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let mut catalog = self.load_catalog_for_write().await?;
        if catalog.remove(name).is_none() {
            tracing::debug!(name, "Delete of unknown design ignored");
            return Ok(());
        }

        self.write_catalog(&catalog).await.inspect_err(|e| {
            tracing::error!(name, error = %e, "Failed to delete design");
        })?;

        tracing::info!(name, "Design deleted");
        Ok(())
    }

    async fn exists(&self, name: &str) -> bool {
        self.get_all().await.contains_key(name)
    }

    async fn rename(&self, old_name: &str, new_name: &str) -> Result<()> {
        if new_name.trim().is_empty() {
            return Err(DesignError::validation("Design name must not be empty"));
        }

        let mut catalog = self.load_catalog_for_write().await?;
        if catalog.contains_key(new_name) {
            return Err(DesignError::conflict(ENTITY, new_name));
        }

        let mut record = catalog
            .remove(old_name)
            .ok_or_else(|| DesignError::not_found(ENTITY, old_name))?;
        record.name = new_name.to_string();
        record.updated_at = self.clock.now_millis();
        catalog.insert(new_name.to_string(), record);

        self.write_catalog(&catalog).await.inspect_err(|e| {
            tracing::error!(old_name, new_name, error = %e, "Failed to rename design");
        })?;

        tracing::info!(old_name, new_name, "Design renamed");
        Ok(())
    }

    async fn duplicate(&self, original_name: &str, desired_name: Option<&str>) -> Result<String> {
        let mut catalog = self.load_catalog_for_write().await?;
        let original = catalog
            .get(original_name)
            .cloned()
            .ok_or_else(|| DesignError::not_found(ENTITY, original_name))?;

        let desired_name = desired_name.filter(|n| !n.trim().is_empty());
        let name = duplicate_name(original_name, desired_name, |candidate| {
            catalog.contains_key(candidate)
        });
        let now = self.clock.now_millis();

        catalog.insert(
            name.clone(),
            DesignRecord {
                name: name.clone(),
                design: normalize(Some(original.design.into_value())),
                created_at: now,
                updated_at: now,
                last_auto_save: original.last_auto_save,
            },
        );

        self.write_catalog(&catalog).await.inspect_err(|e| {
            tracing::error!(original_name, error = %e, "Failed to duplicate design");
        })?;

        tracing::info!(original_name, duplicate = %name, "Design duplicated");
        Ok(name)
    }

    async fn export_all(&self) -> Result<String> {
        let catalog = self.get_all().await;
        Ok(serde_json::to_string_pretty(&catalog)?)
    }

    async fn import_all(&self, blob: &str) -> Result<Vec<String>> {
        let incoming: Map<String, Value> = serde_json::from_str(blob)
            .map_err(|e| DesignError::import(format!("Invalid file format: {}", e)))?;

        if let Some((name, _)) = incoming.iter().find(|(_, entry)| !entry.is_object()) {
            return Err(DesignError::import(format!(
                "Invalid file format: entry '{}' is not a design record",
                name
            )));
        }

        let mut catalog = self.load_catalog_for_write().await?;
        let now = self.clock.now_millis();
        let mut imported = Vec::with_capacity(incoming.len());

        for (key, entry) in incoming {
            let name = unique_name(&key, |candidate| catalog.contains_key(candidate));
            let (mut record, _) = StoredDesignRecord::into_record(name.clone(), entry, now);
            record.updated_at = now;
            if name != key {
                tracing::debug!(original = %key, renamed = %name, "Imported design renamed to avoid clash");
            }
            catalog.insert(name.clone(), record);
            imported.push(name);
        }

        self.write_catalog(&catalog).await.inspect_err(|e| {
            tracing::error!(error = %e, "Failed to import designs");
        })?;

        tracing::info!(count = imported.len(), "Designs imported");
        Ok(imported)
    }

    async fn usage(&self) -> StorageUsage {
        let catalog = self.get_all().await;
        match serde_json::to_string(&catalog) {
            Ok(serialized) => StorageUsage::measure(serialized.len() as u64, self.capacity_bytes),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to measure storage usage");
                StorageUsage::default()
            }
        }
    }

    async fn search(&self, query: &str) -> DesignCatalog {
        let needle = query.to_lowercase();
        self.get_all()
            .await
            .into_iter()
            .filter(|(name, _)| name.to_lowercase().contains(&needle))
            .collect()
    }

    async fn count(&self) -> usize {
        self.get_all().await.len()
    }

    async fn list_summaries(&self) -> Vec<DesignSummary> {
        newest_first(&self.get_all().await)
    }

    async fn clear_all(&self) -> Result<()> {
        let to_persistence = |e: DesignError| DesignError::persistence(format!("Failed to clear designs: {}", e));

        self.store
            .remove(&self.store_key)
            .await
            .map_err(to_persistence)?;

        let prefix = self.autosave_key_prefix();
        let keys = self.store.keys().await.map_err(to_persistence)?;
        for key in keys.iter().filter(|k| k.starts_with(&prefix)) {
            self.store.remove(key).await.map_err(to_persistence)?;
        }

        tracing::info!("All designs cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKeyValueStore;
    use designhub_core::clock::ManualClock;
    use serde_json::json;

    struct Fixture {
        store: MemoryKeyValueStore,
        clock: ManualClock,
        repo: KvDesignRepository,
    }

    fn fixture() -> Fixture {
        let store = MemoryKeyValueStore::new();
        let clock = ManualClock::new(1_000);
        let repo = KvDesignRepository::new(Arc::new(store.clone())).with_clock(Arc::new(clock.clone()));
        Fixture { store, clock, repo }
    }

    fn doc(rows: usize) -> DesignDocument {
        let rows: Vec<Value> = (0..rows).map(|i| json!({"id": format!("row_{}", i)})).collect();
        normalize(Some(json!({"body": {"rows": rows, "values": {}}, "schemaVersion": 16})))
    }

    async fn raw_store(f: &Fixture) -> Option<String> {
        f.store.get("email_template_designs").await.unwrap()
    }

    #[tokio::test]
    async fn test_save_then_get_returns_normalized_document() {
        let f = fixture();
        let input = json!({"body": {"rows": "broken"}});

        f.repo.save("A", normalize(Some(input.clone()))).await.unwrap();

        assert_eq!(f.repo.get("A").await, Some(normalize(Some(input))));
        assert!(f.repo.exists("A").await);
        assert!(!f.repo.exists("B").await);
    }

    #[tokio::test]
    async fn test_save_twice_preserves_created_at() {
        let f = fixture();

        f.repo.save("Promo", doc(1)).await.unwrap();
        f.clock.advance(5_000);
        f.repo.save("Promo", doc(2)).await.unwrap();

        let record = f.repo.get_record("Promo").await.unwrap();
        assert_eq!(record.design, doc(2));
        assert_eq!(record.created_at, 1_000);
        assert_eq!(record.updated_at, 6_000);
        assert_eq!(record.last_auto_save, Some(6_000));
    }

    #[tokio::test]
    async fn test_save_rejects_empty_name() {
        let f = fixture();
        let err = f.repo.save("   ", doc(0)).await.unwrap_err();

        assert!(err.is_validation());
        assert!(raw_store(&f).await.is_none());
    }

    #[tokio::test]
    async fn test_save_over_quota_is_persistence_error() {
        let f = fixture();
        f.repo.save("Small", doc(0)).await.unwrap();
        let before = raw_store(&f).await;

        f.store.set_quota(Some(10));
        let err = f.repo.save("Big", doc(50)).await.unwrap_err();

        assert!(err.is_persistence());
        assert_eq!(raw_store(&f).await, before);
    }

    #[tokio::test]
    async fn test_get_all_migrates_legacy_entries() {
        let f = fixture();
        f.store
            .set(
                "email_template_designs",
                &json!({
                    "Legacy": {"body": {"rows": [{}], "values": {}}, "schemaVersion": 15},
                    "Current": {"name": "Current", "design": {}, "createdAt": 10, "updatedAt": 20}
                })
                .to_string(),
            )
            .await
            .unwrap();

        let all = f.repo.get_all().await;

        assert_eq!(all.len(), 2);
        let legacy = &all["Legacy"];
        assert_eq!(legacy.created_at, 1_000);
        assert_eq!(legacy.updated_at, 1_000);
        assert_eq!(legacy.design.row_count(), 1);
        assert_eq!(all["Current"].created_at, 10);
        assert_eq!(all["Current"].design.schema_version(), &json!(16));
    }

    #[tokio::test]
    async fn test_corrupt_store_reads_empty_and_blocks_writes() {
        let f = fixture();
        f.store.set("email_template_designs", "{not json").await.unwrap();

        assert!(f.repo.get_all().await.is_empty());
        assert!(f.repo.get("A").await.is_none());
        assert!(f.repo.search("a").await.is_empty());
        assert_eq!(f.repo.count().await, 0);

        let err = f.repo.save("A", doc(0)).await.unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(raw_store(&f).await.as_deref(), Some("{not json"));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let f = fixture();
        f.repo.save("A", doc(0)).await.unwrap();

        f.repo.delete("A").await.unwrap();
        f.repo.delete("A").await.unwrap();

        assert!(!f.repo.exists("A").await);
    }

    #[tokio::test]
    async fn test_rename_moves_record() {
        let f = fixture();
        f.repo.save("A", doc(3)).await.unwrap();
        f.clock.advance(100);

        f.repo.rename("A", "B").await.unwrap();

        assert!(!f.repo.exists("A").await);
        let record = f.repo.get_record("B").await.unwrap();
        assert_eq!(record.name, "B");
        assert_eq!(record.created_at, 1_000);
        assert_eq!(record.updated_at, 1_100);
        assert_eq!(record.design, doc(3));
    }

    #[tokio::test]
    async fn test_rename_conflict_leaves_store_unchanged() {
        let f = fixture();
        f.repo.save("A", doc(1)).await.unwrap();
        f.repo.save("B", doc(2)).await.unwrap();
        let before = raw_store(&f).await;

        let err = f.repo.rename("A", "B").await.unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(raw_store(&f).await, before);
    }

    #[tokio::test]
    async fn test_rename_missing_is_not_found() {
        let f = fixture();
        let err = f.repo.rename("Ghost", "B").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_duplicate_picks_next_free_copy_name() {
        let f = fixture();
        f.repo.save("A", doc(2)).await.unwrap();
        f.repo.save("A (Copy)", doc(0)).await.unwrap();
        f.repo.save("A (Copy 2)", doc(0)).await.unwrap();
        f.clock.advance(50);

        let name = f.repo.duplicate("A", None).await.unwrap();

        assert_eq!(name, "A (Copy 3)");
        let copy = f.repo.get_record(&name).await.unwrap();
        assert_eq!(copy.design, f.repo.get("A").await.unwrap());
        assert_eq!(copy.created_at, 1_050);
        assert_eq!(copy.updated_at, 1_050);
    }

    #[tokio::test]
    async fn test_duplicate_is_independent_of_original() {
        let f = fixture();
        f.repo.save("A", doc(1)).await.unwrap();

        let name = f.repo.duplicate("A", Some("B")).await.unwrap();
        assert_eq!(name, "B");
        f.repo.save("B", doc(4)).await.unwrap();

        assert_eq!(f.repo.get("A").await, Some(doc(1)));
        assert_eq!(f.repo.get("B").await, Some(doc(4)));
    }

    #[tokio::test]
    async fn test_duplicate_with_taken_desired_name() {
        let f = fixture();
        f.repo.save("A", doc(1)).await.unwrap();
        f.repo.save("B", doc(1)).await.unwrap();

        assert_eq!(f.repo.duplicate("A", Some("B")).await.unwrap(), "B (2)");
    }

    #[tokio::test]
    async fn test_duplicate_missing_is_not_found() {
        let f = fixture();
        assert!(f.repo.duplicate("Ghost", None).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_export_then_import_into_other_repository() {
        let source = fixture();
        source.repo.save("A", doc(1)).await.unwrap();
        source.repo.save("B", doc(2)).await.unwrap();
        let blob = source.repo.export_all().await.unwrap();
        assert!(blob.contains('\n'));

        let target = fixture();
        target.clock.set(9_000);
        let imported = target.repo.import_all(&blob).await.unwrap();

        assert_eq!(imported, vec!["A".to_string(), "B".to_string()]);
        let b = target.repo.get_record("B").await.unwrap();
        assert_eq!(b.design, doc(2));
        assert_eq!(b.created_at, 1_000);
        assert_eq!(b.updated_at, 9_000);
    }

    #[tokio::test]
    async fn test_import_collision_gets_suffix_and_original_untouched() {
        let f = fixture();
        f.repo.save("Promo", doc(1)).await.unwrap();
        let original = f.repo.get_record("Promo").await.unwrap();

        let blob = json!({
            "Promo": {"name": "Promo", "design": {"body": {"rows": [{}, {}, {}], "values": {}}}, "createdAt": 5, "updatedAt": 5}
        })
        .to_string();
        f.clock.advance(10);
        let imported = f.repo.import_all(&blob).await.unwrap();

        assert_eq!(imported, vec!["Promo (2)".to_string()]);
        assert_eq!(f.repo.get_record("Promo").await.unwrap(), original);
        let copy = f.repo.get_record("Promo (2)").await.unwrap();
        assert_eq!(copy.name, "Promo (2)");
        assert_eq!(copy.design.row_count(), 3);
        assert_eq!(copy.updated_at, 1_010);
    }

    #[tokio::test]
    async fn test_import_rejects_bad_payload_without_writing() {
        let f = fixture();
        f.repo.save("Keep", doc(1)).await.unwrap();
        let before = raw_store(&f).await;

        for blob in ["{\"A\": {\"design\": {}", "[1, 2]", "{\"A\": {\"design\": {}}, \"B\": 3}"] {
            let err = f.repo.import_all(blob).await.unwrap_err();
            assert!(err.is_import(), "blob: {}", blob);
        }

        assert_eq!(raw_store(&f).await, before);
    }

    #[tokio::test]
    async fn test_usage_measures_serialized_store() {
        let f = fixture();
        assert_eq!(f.repo.usage().await.used, 2);

        f.repo.save("A", doc(5)).await.unwrap();
        let usage = f.repo.usage().await;
        let expected = serde_json::to_string(&f.repo.get_all().await).unwrap().len() as u64;

        assert_eq!(usage.used, expected);
        assert_eq!(usage.available, 5 * 1024 * 1024);
        assert_eq!(usage.percentage, 0);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let f = fixture();
        for name in ["Spring Sale", "summer newsletter", "Welcome"] {
            f.repo.save(name, doc(0)).await.unwrap();
        }

        let found = f.repo.search("S").await;
        let names: Vec<&String> = found.keys().collect();
        assert_eq!(names, vec!["Spring Sale", "summer newsletter"]);

        assert_eq!(f.repo.search("").await.len(), 3);
        assert!(f.repo.search("zzz").await.is_empty());
    }

    #[tokio::test]
    async fn test_list_summaries_newest_first() {
        let f = fixture();
        f.repo.save("Old", doc(1)).await.unwrap();
        f.clock.advance(10);
        f.repo.save("New", doc(2)).await.unwrap();

        let summaries = f.repo.list_summaries().await;
        let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["New", "Old"]);
        assert_eq!(summaries[0].row_count, 2);
        assert_eq!(f.repo.count().await, 2);
    }

    #[tokio::test]
    async fn test_clear_all_removes_designs_and_autosave_slots() {
        let f = fixture();
        f.repo.save("A", doc(0)).await.unwrap();
        f.store.set("design_autosave_new", "{}").await.unwrap();
        f.store.set("design_autosave_A", "{}").await.unwrap();
        f.store.set("unrelated", "x").await.unwrap();

        f.repo.clear_all().await.unwrap();

        assert_eq!(f.repo.count().await, 0);
        assert_eq!(f.store.keys().await.unwrap(), vec!["unrelated".to_string()]);
    }
}
