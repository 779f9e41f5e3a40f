//! Data Transfer Objects (DTOs) for persistence.
//!
//! These DTOs represent the persisted shapes of designs and autosave slots.
//! They are private to the infrastructure layer and handle the evolution of
//! the storage format over time.
//!
//! ### Design store
//! Unversioned JSON object keyed by design name; legacy entries are detected
//! by shape (see [`StoredDesignRecord`]).
//!
//! ### AutoSave slot Version History
//! - **unversioned**: raw document, or `{ design, timestamp }`
//! - **1.0.0**: `{ version, document, timestamp }`

mod autosave;
mod design_record;

pub use autosave::{
    AUTOSAVE_ENTITY, AutoSaveSlotV1_0_0, LegacyAutoSaveSlot, create_autosave_migrator,
};
pub use design_record::{StoredDesignRecord, StoredEntryShape};
