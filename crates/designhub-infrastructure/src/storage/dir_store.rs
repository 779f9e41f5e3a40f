//! Directory-backed key-value store.
//!
//! Each key is stored in its own file under a root directory. File names are
//! the URL-safe base64 encoding of the key, so design names containing
//! slashes, spaces or dots map to valid, unambiguous file names.
//!
//! File location: `{root}/{base64(key)}.json`

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::task;

use designhub_core::DesignError;
use designhub_core::error::Result;
use designhub_core::storage::KeyValueStore;

use super::atomic_file::AtomicFile;

/// File-per-key store with atomic writes.
///
/// # Features
///
/// - **Atomic writes**: values are replaced via tmp file + rename
/// - **Async-safe**: all file operations run in `tokio::task::spawn_blocking`
#[derive(Debug, Clone)]
pub struct DirKeyValueStore {
    root: PathBuf,
}

impl DirKeyValueStore {
    const EXTENSION: &'static str = "json";

    /// Creates a store rooted at `root`. The directory is created lazily on
    /// the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_for(&self, key: &str) -> AtomicFile {
        let file_name = format!("{}.{}", URL_SAFE_NO_PAD.encode(key), Self::EXTENSION);
        AtomicFile::new(self.root.join(file_name))
    }

    fn key_from_path(path: &Path) -> Option<String> {
        if path.extension().and_then(|e| e.to_str()) != Some(Self::EXTENSION) {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        let bytes = URL_SAFE_NO_PAD.decode(stem).ok()?;
        String::from_utf8(bytes).ok()
    }

    fn list_keys_sync(root: &Path) -> Result<Vec<String>> {
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(DesignError::persistence(format!(
                    "Failed to list store directory '{}': {}",
                    root.display(),
                    e
                )));
            }
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry?;
            if let Some(key) = Self::key_from_path(&entry.path()) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Runs blocking file work off the async runtime.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(f)
        .await
        .map_err(|e| DesignError::internal(format!("Storage task failed: {}", e)))?
}

#[async_trait]
impl KeyValueStore for DirKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let file = self.file_for(key);
        blocking(move || Ok(file.read()?)).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let file = self.file_for(key);
        let value = value.to_string();
        tracing::debug!(key, path = %file.path().display(), bytes = value.len(), "Writing store value");
        blocking(move || Ok(file.write(&value)?)).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let file = self.file_for(key);
        blocking(move || Ok(file.remove()?)).await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let root = self.root.clone();
        blocking(move || Self::list_keys_sync(&root)).await
    }
}
