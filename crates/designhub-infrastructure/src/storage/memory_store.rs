//! In-memory key-value store.
//!
//! Behaves like browser local storage: a flat map with an optional byte
//! quota, shared between clones. Used in tests and for throwaway sessions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use designhub_core::DesignError;
use designhub_core::error::Result;
use designhub_core::storage::KeyValueStore;

const UNLIMITED: u64 = u64::MAX;

#[derive(Debug, Clone)]
pub struct MemoryKeyValueStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
    quota_bytes: Arc<AtomicU64>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            quota_bytes: Arc::new(AtomicU64::new(UNLIMITED)),
        }
    }

    /// Creates a store that rejects writes once the total size of keys and
    /// values would exceed `bytes`.
    pub fn with_quota(bytes: u64) -> Self {
        let store = Self::new();
        store.set_quota(Some(bytes));
        store
    }

    /// Changes the quota; `None` removes it. Existing entries are kept even
    /// when they already exceed the new quota.
    pub fn set_quota(&self, bytes: Option<u64>) {
        self.quota_bytes
            .store(bytes.unwrap_or(UNLIMITED), Ordering::SeqCst);
    }

    #[cfg(test)]
    async fn used_bytes(&self) -> u64 {
        entry_bytes(self.entries.read().await.iter())
    }
}

/// Total size of the given keys and values in bytes.
fn entry_bytes<'a>(entries: impl Iterator<Item = (&'a String, &'a String)>) -> u64 {
    entries.map(|(k, v)| (k.len() + v.len()) as u64).sum()
}

impl Default for MemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().await;

        let quota = self.quota_bytes.load(Ordering::SeqCst);
        if quota != UNLIMITED {
            let others = entry_bytes(entries.iter().filter(|(k, _)| k.as_str() != key));
            let required = others + (key.len() + value.len()) as u64;
            if required > quota {
                return Err(DesignError::persistence(format!(
                    "Storage quota exceeded: {} bytes required, {} bytes allowed",
                    required, quota
                )));
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}
