//! Routes a model-issued invocation to its handler.
//!
//! Every dispatch produces a [`ToolResult`]: unknown names, malformed
//! input and handler failures all come back as structured error payloads
//! for the model to read, never as an `Err`.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use hubpilot_core::error::ToolError;
use hubpilot_core::event::{DomainEvent, EventBus};
use hubpilot_core::store::{BlobStorage, ConversationStore, InventoryStore};
use hubpilot_core::tool::{
    ToolContext, ToolDefinition, ToolHandler, ToolInvocation, ToolName, ToolOutput, ToolResult,
};
use tracing::{debug, warn};

use crate::catalog;
use crate::generate_file::GenerateFileHandler;
use crate::inventory::InventoryHandler;
use crate::update_context::UpdateContextHandler;
use crate::web_search::{SearchBackend, WebSearchHandler};

pub struct ToolDispatcher {
    web_search: WebSearchHandler,
    inventory: InventoryHandler,
    update_context: UpdateContextHandler,
    generate_file: GenerateFileHandler,
    event_bus: Option<Arc<EventBus>>,
}

impl ToolDispatcher {
    /// A dispatcher with no search backend and no blob storage; those
    /// tools answer with a "not configured" payload until attached.
    pub fn new(inventory: Arc<dyn InventoryStore>, conversations: Arc<dyn ConversationStore>) -> Self {
        Self {
            web_search: WebSearchHandler::unconfigured(),
            inventory: InventoryHandler::new(inventory),
            update_context: UpdateContextHandler::new(conversations.clone()),
            generate_file: GenerateFileHandler::new(None, conversations),
            event_bus: None,
        }
    }

    pub fn with_search(mut self, backend: Arc<dyn SearchBackend>) -> Self {
        self.web_search = WebSearchHandler::new(backend);
        self
    }

    pub fn with_blob_storage(
        mut self,
        blobs: Arc<dyn BlobStorage>,
        conversations: Arc<dyn ConversationStore>,
    ) -> Self {
        self.generate_file = GenerateFileHandler::new(Some(blobs), conversations);
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// The tool catalog.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        catalog::tool_catalog()
    }

    pub fn search_configured(&self) -> bool {
        self.web_search.is_configured()
    }

    /// Run one invocation to completion.
    pub async fn dispatch(&self, ctx: &ToolContext, invocation: &ToolInvocation) -> ToolResult {
        let start = Instant::now();
        let outcome = match invocation.name.parse::<ToolName>() {
            Ok(name) => self.route(name, ctx, invocation.input.clone()).await,
            Err(e) => Err(e),
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(output) => {
                debug!(tool = %invocation.name, duration_ms, "Tool executed");
                if let (Some(bus), Some(artifact)) = (&self.event_bus, &output.artifact) {
                    bus.publish(DomainEvent::ArtifactCreated {
                        conversation_id: ctx.conversation_id.clone(),
                        artifact_id: artifact.id.clone(),
                        filename: artifact.filename.clone(),
                        timestamp: Utc::now(),
                    });
                }
                ToolResult {
                    tool_use_id: invocation.id.clone(),
                    content: output.payload.to_string(),
                    is_error: false,
                    artifact: output.artifact,
                }
            }
            Err(e) => {
                warn!(tool = %invocation.name, error = %e, duration_ms, "Tool execution failed");
                ToolResult {
                    tool_use_id: invocation.id.clone(),
                    content: e.to_payload().to_string(),
                    is_error: true,
                    artifact: None,
                }
            }
        };

        if let Some(bus) = &self.event_bus {
            bus.publish(DomainEvent::ToolExecuted {
                tool_name: invocation.name.clone(),
                success: !result.is_error,
                duration_ms,
                timestamp: Utc::now(),
            });
        }

        result
    }

    async fn route(
        &self,
        name: ToolName,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, ToolError> {
        match name {
            ToolName::WebSearch => run(&self.web_search, ctx, input).await,
            ToolName::GetInventory => run(&self.inventory, ctx, input).await,
            ToolName::UpdateContext => run(&self.update_context, ctx, input).await,
            ToolName::GenerateFile => run(&self.generate_file, ctx, input).await,
        }
    }
}

/// Deserialize, validate, then handle.
async fn run<H: ToolHandler>(
    handler: &H,
    ctx: &ToolContext,
    input: serde_json::Value,
) -> Result<ToolOutput, ToolError> {
    // A tool called with no arguments arrives as null.
    let input = if input.is_null() {
        serde_json::json!({})
    } else {
        input
    };

    let typed: H::Input =
        serde_json::from_value(input).map_err(|e| ToolError::InvalidArguments {
            tool: handler.name().to_string(),
            reason: e.to_string(),
        })?;
    handler.validate(&typed)?;
    handler.handle(ctx, typed).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubpilot_core::inventory::Publication;
    use hubpilot_store::{InMemoryBlobStorage, InMemoryConversationStore, InMemoryInventory};
    use serde_json::{Value, json};

    fn ctx() -> ToolContext {
        ToolContext {
            tenant_id: "hub-1".into(),
            conversation_id: "c1".into(),
            user_id: "u1".into(),
        }
    }

    fn call(name: &str, input: Value) -> ToolInvocation {
        ToolInvocation {
            id: "toolu_1".into(),
            name: name.into(),
            input,
        }
    }

    fn dispatcher() -> (ToolDispatcher, Arc<InMemoryConversationStore>) {
        let inventory = InMemoryInventory::new().with_hub(
            "hub-1",
            vec![Publication {
                publisher_id: "pub-1".into(),
                name: "Riverside Gazette".into(),
                description: None,
                website: None,
                channels: vec!["print".into()],
                geography: None,
                audience_size: None,
                offerings: vec![],
            }],
        );
        let conversations = Arc::new(InMemoryConversationStore::new());
        let dispatcher = ToolDispatcher::new(Arc::new(inventory), conversations.clone())
            .with_blob_storage(Arc::new(InMemoryBlobStorage::new()), conversations.clone());
        (dispatcher, conversations)
    }

    fn payload(result: &ToolResult) -> Value {
        serde_json::from_str(&result.content).unwrap()
    }

    #[tokio::test]
    async fn unknown_tool_is_structured_error() {
        let (d, _) = dispatcher();
        let result = d.dispatch(&ctx(), &call("shell", json!({"cmd": "ls"}))).await;
        assert!(result.is_error);
        assert_eq!(result.tool_use_id, "toolu_1");
        assert_eq!(payload(&result)["error"], "Unknown tool: shell");
    }

    #[tokio::test]
    async fn malformed_input_is_invalid_arguments() {
        let (d, _) = dispatcher();
        let result = d
            .dispatch(&ctx(), &call("get_inventory", json!({"queryType": "everything"})))
            .await;
        assert!(result.is_error);
        let error = payload(&result)["error"].as_str().unwrap().to_string();
        assert!(error.starts_with("Invalid arguments for get_inventory"));
    }

    #[tokio::test]
    async fn validation_failure_is_structured() {
        let (d, _) = dispatcher();
        let result = d
            .dispatch(&ctx(), &call("web_search", json!({"query": "  "})))
            .await;
        assert!(result.is_error);
        assert!(payload(&result)["error"].is_string());
    }

    #[tokio::test]
    async fn null_input_is_treated_as_empty_object() {
        let (d, _) = dispatcher();
        let result = d.dispatch(&ctx(), &call("get_inventory", Value::Null)).await;
        assert!(!result.is_error);
        assert_eq!(payload(&result)["queryType"], "all");
    }

    #[tokio::test]
    async fn unconfigured_search_keeps_suggestion() {
        let (d, _) = dispatcher();
        assert!(!d.search_configured());
        let result = d
            .dispatch(&ctx(), &call("web_search", json!({"query": "Acme Coffee"})))
            .await;
        assert!(result.is_error);
        assert!(payload(&result)["suggestion"].is_string());
    }

    #[tokio::test]
    async fn update_context_reaches_the_store() {
        let (d, conversations) = dispatcher();
        let result = d
            .dispatch(&ctx(), &call("update_context", json!({"brandName": "Acme"})))
            .await;
        assert!(!result.is_error);
        let stored = conversations.read_context("c1", "u1").await.unwrap();
        assert_eq!(stored.brand_name.as_deref(), Some("Acme"));
    }

    #[tokio::test]
    async fn events_are_published() {
        let (d, _) = dispatcher();
        let bus = Arc::new(EventBus::new(16));
        let mut rx = bus.subscribe();
        let d = d.with_event_bus(bus);

        let result = d
            .dispatch(
                &ctx(),
                &call("generate_file", json!({"fileType": "document", "content": "# Plan"})),
            )
            .await;
        assert!(result.artifact.is_some());

        let first = rx.recv().await.unwrap();
        assert!(matches!(first.as_ref(), DomainEvent::ArtifactCreated { .. }));
        let second = rx.recv().await.unwrap();
        match second.as_ref() {
            DomainEvent::ToolExecuted {
                tool_name, success, ..
            } => {
                assert_eq!(tool_name, "generate_file");
                assert!(success);
            }
            other => panic!("Expected ToolExecuted, got {other:?}"),
        }
    }

    #[test]
    fn definitions_match_catalog() {
        let (d, _) = dispatcher();
        assert_eq!(d.definitions(), catalog::tool_catalog());
    }
}
