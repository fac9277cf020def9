//! File-based conversation store: one JSON document per conversation.
//!
//! Storage location: `<data_dir>/conversations/<conversation_id>.json`
//! (by default `~/.hubpilot/data`).
//!
//! Records are loaded lazily into a cache and flushed to disk on every
//! mutation, so reads are fast and writes are durable.

use async_trait::async_trait;
use hubpilot_core::error::StoreError;
use hubpilot_core::store::ConversationStore;
use hubpilot_core::{GeneratedArtifact, SessionContext};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::ConversationRecord;

pub struct FileConversationStore {
    root: PathBuf,
    cache: Arc<RwLock<HashMap<String, ConversationRecord>>>,
}

impl FileConversationStore {
    /// Create a store rooted at `data_dir`. The directory is created on first write.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let root = data_dir.into().join("conversations");
        debug!(path = %root.display(), "File conversation store opened");
        Self {
            root,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn record_path(&self, conversation_id: &str) -> Result<PathBuf, StoreError> {
        let valid = !conversation_id.is_empty()
            && conversation_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::NotFound(format!(
                "Invalid conversation id: {conversation_id}"
            )));
        }
        Ok(self.root.join(format!("{conversation_id}.json")))
    }

    fn load_from_disk(path: &Path) -> Result<Option<ConversationRecord>, StoreError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Unavailable(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )));
            }
        };

        match serde_json::from_str(&content) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping corrupted conversation record");
                Ok(None)
            }
        }
    }

    /// Fetch a record into the cache, from disk if needed.
    async fn load(&self, conversation_id: &str) -> Result<Option<ConversationRecord>, StoreError> {
        if let Some(record) = self.cache.read().await.get(conversation_id) {
            return Ok(Some(record.clone()));
        }
        let path = self.record_path(conversation_id)?;
        let loaded = Self::load_from_disk(&path)?;
        if let Some(record) = &loaded {
            self.cache
                .write()
                .await
                .insert(conversation_id.to_string(), record.clone());
        }
        Ok(loaded)
    }

    /// Apply `change` to the record and flush it.
    async fn mutate<F>(&self, conversation_id: &str, user_id: &str, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut ConversationRecord),
    {
        let path = self.record_path(conversation_id)?;
        let mut record = self
            .load(conversation_id)
            .await?
            .unwrap_or_else(|| ConversationRecord::new(conversation_id, user_id));
        change(&mut record);
        record.touch();

        std::fs::create_dir_all(&self.root).map_err(|e| {
            StoreError::WriteFailed(format!("Failed to create conversation directory: {e}"))
        })?;
        let json = serde_json::to_string_pretty(&record)?;
        std::fs::write(&path, json)
            .map_err(|e| StoreError::WriteFailed(format!("Failed to write conversation file: {e}")))?;

        self.cache
            .write()
            .await
            .insert(conversation_id.to_string(), record);
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for FileConversationStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn read_context(
        &self,
        conversation_id: &str,
        _user_id: &str,
    ) -> Result<SessionContext, StoreError> {
        Ok(self
            .load(conversation_id)
            .await?
            .map(|r| r.context)
            .unwrap_or_default())
    }

    async fn merge_context(
        &self,
        conversation_id: &str,
        user_id: &str,
        patch: &SessionContext,
    ) -> Result<(), StoreError> {
        self.mutate(conversation_id, user_id, |record| {
            record.context.merge(patch);
        })
        .await
    }

    async fn record_artifact(
        &self,
        conversation_id: &str,
        user_id: &str,
        artifact: &GeneratedArtifact,
    ) -> Result<(), StoreError> {
        self.mutate(conversation_id, user_id, |record| {
            record.artifacts.push(artifact.clone());
        })
        .await
    }

    async fn list_artifacts(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<GeneratedArtifact>, StoreError> {
        Ok(self
            .load(conversation_id)
            .await?
            .map(|r| r.artifacts)
            .unwrap_or_default())
    }
}
