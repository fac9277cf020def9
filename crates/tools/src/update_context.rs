//! Session context tool: remembers facts about the prospect.

use std::sync::Arc;

use async_trait::async_trait;
use hubpilot_core::error::ToolError;
use hubpilot_core::session::SessionContext;
use hubpilot_core::store::ConversationStore;
use hubpilot_core::tool::{ToolContext, ToolHandler, ToolName, ToolOutput};
use tracing::debug;

pub struct UpdateContextHandler {
    store: Arc<dyn ConversationStore>,
}

impl UpdateContextHandler {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolHandler for UpdateContextHandler {
    type Input = SessionContext;

    fn name(&self) -> ToolName {
        ToolName::UpdateContext
    }

    async fn handle(&self, ctx: &ToolContext, patch: SessionContext) -> Result<ToolOutput, ToolError> {
        // Names of the fields the patch carries.
        let updated_fields = SessionContext::default().merge(&patch);

        if !updated_fields.is_empty() {
            self.store
                .merge_context(&ctx.conversation_id, &ctx.user_id, &patch)
                .await?;
            debug!(
                conversation_id = %ctx.conversation_id,
                fields = ?updated_fields,
                "Session context updated"
            );
        }

        Ok(ToolOutput::json(serde_json::json!({
            "success": true,
            "updatedFields": updated_fields,
        })))
    }
}
