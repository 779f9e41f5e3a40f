//! Autosave slot domain models.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::design::DesignDocument;

/// Session identifier used for a design that has not been saved yet.
pub const NEW_DESIGN_SENTINEL: &str = "new";

/// Identity of an autosave slot.
///
/// Each editing session owns exactly one slot, keyed by the design it was
/// opened for or by the "new design" sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AutoSaveKey {
    New,
    Design(String),
}

impl AutoSaveKey {
    /// Maps a session's design id to its slot. `None`, an empty id and the
    /// `"new"` sentinel all share the new-design slot.
    pub fn for_session(design_id: Option<&str>) -> Self {
        match design_id {
            Some(id) if !id.is_empty() && id != NEW_DESIGN_SENTINEL => Self::Design(id.to_string()),
            _ => Self::New,
        }
    }

    /// The design id this slot belongs to, if any.
    pub fn design_id(&self) -> Option<&str> {
        match self {
            Self::New => None,
            Self::Design(id) => Some(id),
        }
    }

    /// Storage key of this slot: `"<prefix>_<designId>"` or `"<prefix>_new"`.
    pub fn storage_key(&self, prefix: &str) -> String {
        format!("{}_{}", prefix, self)
    }
}

impl fmt::Display for AutoSaveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => f.write_str(NEW_DESIGN_SENTINEL),
            Self::Design(id) => f.write_str(id),
        }
    }
}

/// Most recent in-progress state of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoSaveSnapshot {
    pub document: DesignDocument,
    /// Epoch milliseconds of the write.
    pub timestamp: i64,
}
