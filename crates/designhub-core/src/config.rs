//! Configuration model.
//!
//! Every field has a default so a missing or partial `config.toml` still
//! yields a working configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Storage key of the serialized design collection.
pub const DEFAULT_STORE_KEY: &str = "email_template_designs";

/// Prefix of per-session autosave slot keys.
pub const DEFAULT_AUTOSAVE_PREFIX: &str = "design_autosave";

/// Capacity the store size is reported against (5 MiB).
pub const DEFAULT_CAPACITY_BYTES: u64 = 5 * 1024 * 1024;

/// Quiet period after the last edit before an autosave is written.
pub const DEFAULT_AUTOSAVE_DEBOUNCE_MS: u64 = 400;

/// Time the editor gets after a load before edits are trusted again.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1000;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct DesignHubConfig {
    pub storage: StorageConfig,
    pub session: SessionConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the store files. Falls back to the platform data
    /// directory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub store_key: String,
    pub autosave_prefix: String,
    pub capacity_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            store_key: DEFAULT_STORE_KEY.to_string(),
            autosave_prefix: DEFAULT_AUTOSAVE_PREFIX.to_string(),
            capacity_bytes: DEFAULT_CAPACITY_BYTES,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    pub autosave_debounce_ms: u64,
    pub settle_delay_ms: u64,
}

impl SessionConfig {
    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            autosave_debounce_ms: DEFAULT_AUTOSAVE_DEBOUNCE_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
        }
    }
}
