//! Storage backends for hubpilot.
//!
//! Implements the collaborator traits from `hubpilot_core::store`:
//! conversation state (session context and artifact records), hub
//! inventory, and raw file blobs.

pub mod blob;
pub mod file_backend;
pub mod in_memory;
pub mod inventory;

use chrono::{DateTime, Utc};
use hubpilot_core::{GeneratedArtifact, SessionContext};
use serde::{Deserialize, Serialize};

pub use blob::{FsBlobStorage, InMemoryBlobStorage};
pub use file_backend::FileConversationStore;
pub use in_memory::InMemoryConversationStore;
pub use inventory::InMemoryInventory;

/// Everything persisted for one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    pub conversation_id: String,
    pub user_id: String,
    #[serde(default)]
    pub context: SessionContext,
    #[serde(default)]
    pub artifacts: Vec<GeneratedArtifact>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationRecord {
    pub fn new(conversation_id: &str, user_id: &str) -> Self {
        Self {
            conversation_id: conversation_id.to_string(),
            user_id: user_id.to_string(),
            context: SessionContext::default(),
            artifacts: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Reject keys that would escape a storage root.
pub(crate) fn check_key(key: &str) -> Result<(), hubpilot_core::StoreError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|part| part == ".." || part.is_empty());
    if bad {
        return Err(hubpilot_core::StoreError::WriteFailed(format!(
            "Invalid storage key: {key}"
        )));
    }
    Ok(())
}
