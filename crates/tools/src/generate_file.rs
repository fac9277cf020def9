//! File generation tool.
//!
//! Writes the model's content to blob storage under a conversation-scoped
//! key, then records the artifact. A record is only made once the bytes
//! are stored.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use hubpilot_core::artifact::{ArtifactKind, GeneratedArtifact};
use hubpilot_core::error::ToolError;
use hubpilot_core::store::{BlobStorage, ConversationStore};
use hubpilot_core::tool::{ToolContext, ToolHandler, ToolName, ToolOutput};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

const TOOL: &str = "generate_file";
const MAX_STEM_LEN: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum FileKind {
    #[serde(rename = "document", alias = "report", alias = "markdown")]
    Document,
    #[serde(rename = "tabular-export", alias = "export", alias = "csv")]
    TabularExport,
}

impl FileKind {
    pub fn artifact_kind(self) -> ArtifactKind {
        match self {
            Self::Document => ArtifactKind::Report,
            Self::TabularExport => ArtifactKind::Export,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateFileInput {
    pub file_type: FileKind,
    pub content: String,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Safe file name with the kind's extension.
///
/// Directory parts are dropped, whitespace becomes `-`, anything other
/// than ASCII alphanumerics, `-`, `_` and `.` is removed.
pub fn sanitize_filename(requested: Option<&str>, kind: ArtifactKind) -> String {
    let ext = kind.extension();
    let base = requested
        .unwrap_or_default()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let mut stem: String = base
        .trim()
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' => Some(c),
            c if c.is_whitespace() => Some('-'),
            _ => None,
        })
        .collect();

    let suffix = format!(".{ext}");
    if stem.to_ascii_lowercase().ends_with(&suffix) {
        stem.truncate(stem.len() - suffix.len());
    }
    let stem: String = stem.trim_matches('.').chars().take(MAX_STEM_LEN).collect();

    if stem.is_empty() {
        let prefix = match kind {
            ArtifactKind::Report => "document",
            ArtifactKind::Export => "export",
        };
        format!("{prefix}-{}.{ext}", Utc::now().format("%Y%m%d-%H%M%S"))
    } else {
        format!("{stem}.{ext}")
    }
}

pub fn storage_key(conversation_id: &str, file_id: &str, filename: &str) -> String {
    format!("conversations/{conversation_id}/{file_id}/{filename}")
}

pub struct GenerateFileHandler {
    blobs: Option<Arc<dyn BlobStorage>>,
    conversations: Arc<dyn ConversationStore>,
}

impl GenerateFileHandler {
    pub fn new(blobs: Option<Arc<dyn BlobStorage>>, conversations: Arc<dyn ConversationStore>) -> Self {
        Self {
            blobs,
            conversations,
        }
    }
}

#[async_trait]
impl ToolHandler for GenerateFileHandler {
    type Input = GenerateFileInput;

    fn name(&self) -> ToolName {
        ToolName::GenerateFile
    }

    async fn handle(&self, ctx: &ToolContext, input: GenerateFileInput) -> Result<ToolOutput, ToolError> {
        let blobs = self.blobs.as_ref().ok_or_else(|| ToolError::NotConfigured {
            tool: TOOL.into(),
            reason: "no file storage is configured".into(),
            suggestion: "Include the content directly in your reply instead.".into(),
        })?;

        let kind = input.file_type.artifact_kind();
        let file_id = Uuid::new_v4().to_string();
        let filename = sanitize_filename(input.filename.as_deref(), kind);
        let key = storage_key(&ctx.conversation_id, &file_id, &filename);
        let bytes = input.content.into_bytes();
        let size_bytes = bytes.len() as u64;

        blobs.put(&key, bytes, kind.content_type()).await?;

        let artifact = GeneratedArtifact {
            id: file_id.clone(),
            filename: filename.clone(),
            kind,
            content_type: kind.content_type().to_string(),
            storage_key: key,
            size_bytes,
            created_at: Utc::now(),
        };

        if let Err(e) = self
            .conversations
            .record_artifact(&ctx.conversation_id, &ctx.user_id, &artifact)
            .await
        {
            match blobs.delete(&artifact.storage_key).await {
                Ok(()) => warn!(
                    key = %artifact.storage_key,
                    error = %e,
                    "Stored file could not be recorded, removed it"
                ),
                Err(cleanup) => warn!(
                    key = %artifact.storage_key,
                    error = %e,
                    cleanup_error = %cleanup,
                    "Stored file could not be recorded and is orphaned"
                ),
            }
            return Err(e.into());
        }

        info!(
            conversation_id = %ctx.conversation_id,
            file_id = %file_id,
            filename = %filename,
            size_bytes,
            "File generated"
        );

        Ok(ToolOutput::json(serde_json::json!({
            "success": true,
            "fileId": file_id,
            "filename": filename,
            "message": format!("Created {filename} ({size_bytes} bytes). It is available for download."),
        }))
        .with_artifact(artifact))
    }
}
