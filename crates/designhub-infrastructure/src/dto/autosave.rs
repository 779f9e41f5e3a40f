//! Autosave slot DTOs and migrations
//!
//! ## Version History
//! - **1.0.0**: Initial versioned schema with `document` and `timestamp`
//!
//! Slots written before versioning carry no `version` field. They are either
//! `{ design, timestamp }` wrappers or the raw document itself, and are read
//! through [`LegacyAutoSaveSlot`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use version_migrate::{FromDomain, IntoDomain, Versioned};

use designhub_core::autosave::AutoSaveSnapshot;
use designhub_core::design::normalize;

/// Entity name the autosave migrator is registered under.
pub const AUTOSAVE_ENTITY: &str = "autosave_slot";

/// Autosave slot DTO V1.0.0
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
pub struct AutoSaveSlotV1_0_0 {
    /// Serialized editor state
    pub document: Value,
    /// Epoch milliseconds of the write
    pub timestamp: i64,
}

/// Convert AutoSaveSlotV1_0_0 DTO to domain model
impl IntoDomain<AutoSaveSnapshot> for AutoSaveSlotV1_0_0 {
    fn into_domain(self) -> AutoSaveSnapshot {
        AutoSaveSnapshot {
            document: normalize(Some(self.document)),
            timestamp: self.timestamp,
        }
    }
}

/// Convert domain model to AutoSaveSlotV1_0_0 DTO (for version-migrate save support)
impl FromDomain<AutoSaveSnapshot> for AutoSaveSlotV1_0_0 {
    fn from_domain(snapshot: AutoSaveSnapshot) -> Self {
        AutoSaveSlotV1_0_0 {
            document: snapshot.document.into_value(),
            timestamp: snapshot.timestamp,
        }
    }
}

/// Unversioned slot written by earlier releases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyAutoSaveSlot {
    pub design: Value,
    #[serde(default)]
    pub timestamp: i64,
}

impl LegacyAutoSaveSlot {
    /// Reads an unversioned slot. A value without a `design` field is taken
    /// to be the document itself; non-object values are not a slot at all.
    pub fn from_value(value: Value) -> Option<AutoSaveSnapshot> {
        if !value.is_object() {
            return None;
        }

        let legacy = if value.get("design").is_some() {
            serde_json::from_value::<LegacyAutoSaveSlot>(value).ok()?
        } else {
            LegacyAutoSaveSlot {
                design: value,
                timestamp: 0,
            }
        };

        Some(AutoSaveSnapshot {
            document: normalize(Some(legacy.design)),
            timestamp: legacy.timestamp,
        })
    }
}

// ============================================================================
// Migrator factory
// ============================================================================

/// Creates a Migrator for autosave slot entities.
pub fn create_autosave_migrator() -> version_migrate::Migrator {
    version_migrate::migrator!("autosave_slot" => [
        AutoSaveSlotV1_0_0,
        AutoSaveSnapshot
    ], save = true)
    .expect("Failed to create autosave_slot migrator")
}
