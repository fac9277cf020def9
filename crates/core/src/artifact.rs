//! Generated artifacts: files produced as a side effect of a tool call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Declared type of a generated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Markdown document (proposal, media plan, research summary)
    Report,
    /// CSV export
    Export,
}

impl ArtifactKind {
    /// Conventional file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Report => "md",
            Self::Export => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Report => "text/markdown",
            Self::Export => "text/csv",
        }
    }
}

/// A durably stored file. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedArtifact {
    pub id: String,
    pub filename: String,
    pub kind: ArtifactKind,
    pub content_type: String,
    pub storage_key: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}
