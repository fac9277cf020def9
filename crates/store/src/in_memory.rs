//! In-memory conversation store for tests and ephemeral sessions.

use async_trait::async_trait;
use hubpilot_core::error::StoreError;
use hubpilot_core::store::ConversationStore;
use hubpilot_core::{GeneratedArtifact, SessionContext};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ConversationRecord;

/// Keeps conversation records in a map keyed by conversation id.
/// Nothing survives the process.
pub struct InMemoryConversationStore {
    records: Arc<RwLock<HashMap<String, ConversationRecord>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of conversations held.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn read_context(
        &self,
        conversation_id: &str,
        _user_id: &str,
    ) -> Result<SessionContext, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .get(conversation_id)
            .map(|r| r.context.clone())
            .unwrap_or_default())
    }

    async fn merge_context(
        &self,
        conversation_id: &str,
        user_id: &str,
        patch: &SessionContext,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .entry(conversation_id.to_string())
            .or_insert_with(|| ConversationRecord::new(conversation_id, user_id));
        record.context.merge(patch);
        record.touch();
        Ok(())
    }

    async fn record_artifact(
        &self,
        conversation_id: &str,
        user_id: &str,
        artifact: &GeneratedArtifact,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .entry(conversation_id.to_string())
            .or_insert_with(|| ConversationRecord::new(conversation_id, user_id));
        record.artifacts.push(artifact.clone());
        record.touch();
        Ok(())
    }

    async fn list_artifacts(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<GeneratedArtifact>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .get(conversation_id)
            .map(|r| r.artifacts.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hubpilot_core::ArtifactKind;

    #[tokio::test]
    async fn unknown_conversation_reads_empty_context() {
        let store = InMemoryConversationStore::new();
        let ctx = store.read_context("nope", "u1").await.unwrap();
        assert!(ctx.is_empty());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn merge_is_additive() {
        let store = InMemoryConversationStore::new();
        store
            .merge_context(
                "c1",
                "u1",
                &SessionContext {
                    brand_name: Some("Acme".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store
            .merge_context(
                "c1",
                "u1",
                &SessionContext {
                    budget_monthly: Some(5000.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let ctx = store.read_context("c1", "u1").await.unwrap();
        assert_eq!(ctx.brand_name.as_deref(), Some("Acme"));
        assert_eq!(ctx.budget_monthly, Some(5000.0));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn artifacts_are_listed_in_order() {
        let store = InMemoryConversationStore::new();
        for name in ["a.md", "b.csv"] {
            let artifact = GeneratedArtifact {
                id: name.into(),
                filename: name.into(),
                kind: ArtifactKind::Report,
                content_type: "text/markdown".into(),
                storage_key: format!("conversations/c1/{name}/{name}"),
                size_bytes: 1,
                created_at: Utc::now(),
            };
            store.record_artifact("c1", "u1", &artifact).await.unwrap();
        }
        let listed = store.list_artifacts("c1").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].filename, "a.md");
        assert!(store.list_artifacts("c2").await.unwrap().is_empty());
    }
}
