//! Configuration service implementation.
//!
//! Loads [`DesignHubConfig`] from `config.toml` (by default
//! `~/.config/designhub/config.toml`) and caches it.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use designhub_core::DesignError;
use designhub_core::config::DesignHubConfig;
use designhub_core::error::Result;

use crate::paths::DesignHubPaths;

/// Configuration service that loads and caches the configuration.
///
/// A missing file yields the default configuration. A file that cannot be
/// parsed is logged and also yields the default.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: Option<PathBuf>,
    config: Arc<RwLock<Option<DesignHubConfig>>>,
}

impl ConfigService {
    /// Creates a service reading the platform config file.
    pub fn new() -> Self {
        Self {
            path: DesignHubPaths::config_file()
                .inspect_err(|e| tracing::warn!(error = %e, "Config file location unavailable"))
                .ok(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Creates a service reading `path` instead of the platform config file.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the configuration, loading from file if not cached.
    pub fn get_config(&self) -> DesignHubConfig {
        {
            let cached = self.config.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(ref config) = *cached {
                return config.clone();
            }
        }

        let loaded = match self.path.as_deref() {
            Some(path) => Self::load_config(path).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Using default configuration");
                DesignHubConfig::default()
            }),
            None => DesignHubConfig::default(),
        };

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Some(loaded.clone());
        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn load_config(path: &Path) -> Result<DesignHubConfig> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(DesignHubConfig::default());
            }
            Err(e) => {
                return Err(DesignError::config(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let config = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::with_path(temp_dir.path().join("config.toml"));

        assert_eq!(service.get_config(), DesignHubConfig::default());
    }

    #[test]
    fn test_loads_and_caches() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[session]\nautosave_debounce_ms = 50\n").unwrap();
        let service = ConfigService::with_path(&path);

        assert_eq!(service.get_config().session.autosave_debounce_ms, 50);

        std::fs::write(&path, "[session]\nautosave_debounce_ms = 75\n").unwrap();
        assert_eq!(service.get_config().session.autosave_debounce_ms, 50);

        service.invalidate_cache();
        assert_eq!(service.get_config().session.autosave_debounce_ms, 75);
    }

    #[test]
    fn test_invalid_file_falls_back_to_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[session\nbroken").unwrap();

        assert_eq!(
            ConfigService::with_path(&path).get_config(),
            DesignHubConfig::default()
        );
    }
}
