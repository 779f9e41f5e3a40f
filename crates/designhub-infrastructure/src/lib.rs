pub mod config_service;
pub mod dto;
pub mod kv_autosave_repository;
pub mod kv_design_repository;
pub mod paths;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::kv_autosave_repository::KvAutoSaveRepository;
pub use crate::kv_design_repository::KvDesignRepository;
pub use crate::paths::DesignHubPaths;
pub use crate::storage::{DirKeyValueStore, MemoryKeyValueStore};
