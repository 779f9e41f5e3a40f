//! Export pipeline collaborator.
//!
//! Converting rendered HTML into a downloadable file, an image or a paginated
//! document happens elsewhere; the session only starts an export and tracks
//! that it is busy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Html,
    Image,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Image => "png",
            Self::Pdf => "pdf",
        }
    }

    /// Overlay text shown while the export runs. HTML exports are quick and
    /// show none.
    pub fn busy_label(&self) -> Option<&'static str> {
        match self {
            Self::Html => None,
            Self::Image => Some("Saving image..."),
            Self::Pdf => Some("Saving PDF..."),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A single export job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub format: ExportFormat,
    /// Rendered HTML of the design.
    pub html: String,
    /// File name without extension.
    pub file_stem: String,
}

impl ExportRequest {
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.file_stem, self.format.extension())
    }
}

#[async_trait]
pub trait ExportPipeline: Send + Sync {
    async fn export(&self, request: ExportRequest) -> Result<()>;
}
