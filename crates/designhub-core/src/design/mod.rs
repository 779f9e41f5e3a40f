//! Design domain models and repository traits.
//!
//! Designs are email templates authored in an external visual editor and
//! persisted locally under a user-chosen name.

mod document;
mod naming;
mod record;
mod repository;

pub use document::{CURRENT_SCHEMA_VERSION, DesignDocument, normalize};
pub use naming::{FIRST_COLLISION_SUFFIX, duplicate_name, unique_name};
pub use record::{DesignCatalog, DesignRecord, DesignSummary, StorageUsage, newest_first};
pub use repository::DesignRepository;
