//! Design record domain models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::document::DesignDocument;

/// A named, persisted design.
///
/// Timestamps are epoch milliseconds. `name` is the primary identity and is
/// unique within a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignRecord {
    pub name: String,
    pub design: DesignDocument,
    pub created_at: i64,
    pub updated_at: i64,
    /// Set on explicit save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_auto_save: Option<i64>,
}

impl DesignRecord {
    /// Lightweight view for listings.
    pub fn summary(&self) -> DesignSummary {
        DesignSummary {
            name: self.name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            row_count: self.design.row_count(),
            preview_image: self.design.preview_image_url(),
        }
    }
}

/// All designs keyed by name.
pub type DesignCatalog = BTreeMap<String, DesignRecord>;

/// Summaries of every design in `catalog`, most recently updated first.
pub fn newest_first(catalog: &DesignCatalog) -> Vec<DesignSummary> {
    let mut summaries: Vec<DesignSummary> = catalog.values().map(DesignRecord::summary).collect();
    summaries.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| a.name.cmp(&b.name))
    });
    summaries
}

/// Listing entry for a design, without its full document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignSummary {
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub row_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_image: Option<String>,
}

/// Storage consumption of the design store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageUsage {
    /// Serialized size of the store in bytes.
    pub used: u64,
    /// Capacity the size is measured against.
    pub available: u64,
    /// `used / available`, rounded to a whole percent.
    pub percentage: u32,
}

impl StorageUsage {
    pub fn measure(used: u64, available: u64) -> Self {
        if available == 0 {
            return Self::default();
        }
        let percentage = ((used as f64 / available as f64) * 100.0).round() as u32;
        Self {
            used,
            available,
            percentage,
        }
    }
}
