//! Collaborator traits for the external stores.
//!
//! The core never talks to a database or object store directly. The
//! conversation store owns session context and artifact records, the
//! inventory store serves publications per hub, and blob storage holds raw
//! file bytes.
//!
//! Implementations: in-memory (for testing), file-backed (single node).

use async_trait::async_trait;

use crate::artifact::GeneratedArtifact;
use crate::error::StoreError;
use crate::inventory::Publication;
use crate::session::SessionContext;

/// Persistence of per-conversation state.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// The backend name (e.g., "in_memory", "file").
    fn name(&self) -> &str;

    /// Read the session context; an unknown conversation yields an empty one.
    async fn read_context(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<SessionContext, StoreError>;

    /// Upsert-merge a partial context.
    async fn merge_context(
        &self,
        conversation_id: &str,
        user_id: &str,
        patch: &SessionContext,
    ) -> Result<(), StoreError>;

    /// Record a generated artifact for the conversation.
    async fn record_artifact(
        &self,
        conversation_id: &str,
        user_id: &str,
        artifact: &GeneratedArtifact,
    ) -> Result<(), StoreError>;

    /// All artifacts of a conversation, oldest first.
    async fn list_artifacts(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<GeneratedArtifact>, StoreError>;
}

/// Read-only access to a hub's publications.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    fn name(&self) -> &str;

    async fn list_publications(&self, hub_id: &str) -> Result<Vec<Publication>, StoreError>;
}

/// Raw file storage.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    fn name(&self) -> &str;

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Remove a blob. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
