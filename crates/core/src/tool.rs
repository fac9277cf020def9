//! Tool contract: names, invocations, results and the handler trait.
//!
//! The set of tools is closed: [`ToolName`] enumerates every tool the
//! model may call, and each handler declares a typed input that the
//! dispatcher deserializes before the handler ever runs.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::artifact::GeneratedArtifact;
use crate::error::ToolError;

/// Every tool the model can call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    WebSearch,
    GetInventory,
    UpdateContext,
    GenerateFile,
}

impl ToolName {
    /// All tools, in catalog order.
    pub const ALL: [ToolName; 4] = [
        ToolName::WebSearch,
        ToolName::GetInventory,
        ToolName::UpdateContext,
        ToolName::GenerateFile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebSearch => "web_search",
            Self::GetInventory => "get_inventory",
            Self::UpdateContext => "update_context",
            Self::GenerateFile => "generate_file",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ToolError::UnknownTool(s.to_string()))
    }
}

/// A tool definition sent to the model so it knows what it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's input
    pub input_schema: serde_json::Value,
}

/// A model-issued request to run a tool. Consumed exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Caller-assigned ID (matches the model's tool_use id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Raw input as issued by the model
    pub input: serde_json::Value,
}

/// Ambient execution context handed to every handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolContext {
    /// Hub (tenant) the conversation belongs to
    pub tenant_id: String,

    /// Conversation being served
    pub conversation_id: String,

    /// Acting user
    pub user_id: String,
}

/// What a handler produces on success.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Structured result, serialized for the model
    pub payload: serde_json::Value,

    /// Artifact created as a side effect, if any
    pub artifact: Option<GeneratedArtifact>,
}

impl ToolOutput {
    pub fn json(payload: serde_json::Value) -> Self {
        Self {
            payload,
            artifact: None,
        }
    }

    pub fn with_artifact(mut self, artifact: GeneratedArtifact) -> Self {
        self.artifact = Some(artifact);
        self
    }
}

/// The uniform outcome of dispatching one invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The invocation this result answers
    pub tool_use_id: String,

    /// Serialized JSON object, also on error
    pub content: String,

    /// Whether the handler failed
    #[serde(default)]
    pub is_error: bool,

    /// Artifact produced by a successful call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<GeneratedArtifact>,
}

/// The handler trait shared by all tools.
///
/// `Input` is the tool's validated input; the dispatcher deserializes the
/// model's raw JSON into it and calls [`ToolHandler::validate`] before
/// [`ToolHandler::handle`] runs.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    type Input: DeserializeOwned + Send;

    /// The tool this handler implements.
    fn name(&self) -> ToolName;

    /// Semantic checks serde cannot express (non-empty strings, etc.).
    fn validate(&self, _input: &Self::Input) -> Result<(), ToolError> {
        Ok(())
    }

    /// Run the tool.
    async fn handle(&self, ctx: &ToolContext, input: Self::Input) -> Result<ToolOutput, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_name_round_trips_through_str() {
        for name in ToolName::ALL {
            assert_eq!(name.as_str().parse::<ToolName>().unwrap(), name);
        }
    }

    #[test]
    fn unknown_tool_name_is_rejected() {
        let err = "shell".parse::<ToolName>().unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(ref n) if n == "shell"));
    }

    #[test]
    fn tool_name_serializes_snake_case() {
        let json = serde_json::to_string(&ToolName::GetInventory).unwrap();
        assert_eq!(json, "\"get_inventory\"");
    }
}
