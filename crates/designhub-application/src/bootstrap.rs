//! Wiring of repositories and sessions from configuration.

use std::path::PathBuf;
use std::sync::Arc;

use designhub_core::DesignError;
use designhub_core::autosave::AutoSaveRepository;
use designhub_core::config::DesignHubConfig;
use designhub_core::design::DesignRepository;
use designhub_core::editor::DesignEditor;
use designhub_core::error::Result;
use designhub_core::export::ExportPipeline;
use designhub_core::storage::KeyValueStore;
use designhub_infrastructure::{
    DesignHubPaths, DirKeyValueStore, KvAutoSaveRepository, KvDesignRepository,
};

use crate::session::{SessionCoordinator, SessionServices, TokioScheduler};

/// Repositories sharing one store, plus the configuration sessions use.
pub struct DesignHub {
    config: DesignHubConfig,
    designs: Arc<dyn DesignRepository>,
    autosaves: Arc<dyn AutoSaveRepository>,
}

impl DesignHub {
    /// Opens the directory store named by the configuration, or the platform
    /// data directory when none is set.
    pub fn open(config: DesignHubConfig) -> Result<Self> {
        let root = Self::store_root(&config)?;
        tracing::debug!(root = %root.display(), "Opening design store");
        Ok(Self::with_store(config, Arc::new(DirKeyValueStore::new(root))))
    }

    pub fn with_store(config: DesignHubConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let designs = KvDesignRepository::with_config(store.clone(), &config.storage);
        let autosaves = KvAutoSaveRepository::with_prefix(store, config.storage.autosave_prefix.clone());

        Self {
            config,
            designs: Arc::new(designs),
            autosaves: Arc::new(autosaves),
        }
    }

    fn store_root(config: &DesignHubConfig) -> Result<PathBuf> {
        match &config.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => DesignHubPaths::store_dir().map_err(|e| DesignError::config(e.to_string())),
        }
    }

    pub fn config(&self) -> &DesignHubConfig {
        &self.config
    }

    pub fn designs(&self) -> Arc<dyn DesignRepository> {
        self.designs.clone()
    }

    pub fn autosaves(&self) -> Arc<dyn AutoSaveRepository> {
        self.autosaves.clone()
    }

    /// Creates a session for `design_id` on `editor` with its own timers.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open_session(
        &self,
        design_id: Option<&str>,
        editor: Arc<dyn DesignEditor>,
        exporter: Option<Arc<dyn ExportPipeline>>,
    ) -> SessionCoordinator {
        let services = SessionServices {
            designs: self.designs.clone(),
            autosaves: self.autosaves.clone(),
            editor,
            scheduler: Arc::new(TokioScheduler::new()),
            exporter,
        };
        SessionCoordinator::new(design_id, services, self.config.session.clone())
    }
}
