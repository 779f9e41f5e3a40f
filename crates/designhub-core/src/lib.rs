pub mod autosave;
pub mod clock;
pub mod config;
pub mod design;
pub mod editor;
pub mod error;
pub mod export;
pub mod storage;

// Re-export common error type
pub use error::DesignError;
