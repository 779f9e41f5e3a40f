//! Design record DTOs.
//!
//! The design store is a JSON object mapping names to records. Records are
//! written with the domain `DesignRecord` serialization; on read each entry
//! is classified because older stores hold entries without metadata:
//!
//! - **Current**: `{ name, design, createdAt, updatedAt, lastAutoSave? }`
//! - **MissingMetadata**: `{ design, ... }` without a usable `createdAt`
//! - **RawDocument**: the design document itself, stored directly under its name

use serde::Deserialize;
use serde_json::Value;

use designhub_core::design::{DesignRecord, normalize};

/// Shape an entry was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredEntryShape {
    Current,
    MissingMetadata,
    RawDocument,
}

/// Design record as read back from the store.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDesignRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub design: Value,
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: Option<i64>,
    #[serde(default)]
    pub last_auto_save: Option<i64>,
}

impl StoredDesignRecord {
    /// Converts a raw store entry into a domain record named `name`.
    ///
    /// Entries without a usable `createdAt` get a synthesized wrapper stamped
    /// `now`. The document is always normalized.
    pub fn into_record(name: String, entry: Value, now: i64) -> (DesignRecord, StoredEntryShape) {
        if has_created_at(&entry) {
            match serde_json::from_value::<StoredDesignRecord>(entry.clone()) {
                Ok(stored) => {
                    let record = DesignRecord {
                        name,
                        design: normalize(Some(stored.design)),
                        created_at: stored.created_at,
                        updated_at: stored.updated_at.unwrap_or(stored.created_at),
                        last_auto_save: stored.last_auto_save,
                    };
                    return (record, StoredEntryShape::Current);
                }
                Err(e) => {
                    tracing::debug!(name = %name, error = %e, "Design entry has unreadable metadata");
                }
            }
        }

        let (document, shape) = match entry {
            Value::Object(mut map) if map.contains_key("design") => {
                (map.remove("design"), StoredEntryShape::MissingMetadata)
            }
            other => (Some(other), StoredEntryShape::RawDocument),
        };

        let record = DesignRecord {
            name,
            design: normalize(document),
            created_at: now,
            updated_at: now,
            last_auto_save: None,
        };
        (record, shape)
    }
}

fn has_created_at(entry: &Value) -> bool {
    entry
        .get("createdAt")
        .and_then(Value::as_i64)
        .is_some_and(|ts| ts != 0)
}
