//! Provider trait: the abstraction over the remote model.
//!
//! The model is an opaque function: it receives system instructions, the
//! tool catalog and an ordered conversation, and returns content blocks
//! (text and/or tool invocations), a stop reason and token counts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::{self, ContentBlock, Message, Role};
use crate::tool::{ToolDefinition, ToolInvocation};

/// One model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "claude-sonnet-4-20250514")
    pub model: String,

    /// System instructions (static guidance + session context snapshot)
    pub system: String,

    /// The conversation messages
    pub messages: Vec<Message>,

    /// Available tools the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.7
}

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of turn
    EndTurn,
    /// The model is waiting for tool results
    ToolUse,
    /// Output was cut at `max_tokens`
    MaxTokens,
    /// A stop sequence was hit
    StopSequence,
    /// Anything the provider reports that we do not model
    #[serde(untagged)]
    Other(String),
}

impl StopReason {
    /// Map a provider wire value onto a stop reason.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "end_turn" => Self::EndTurn,
            "tool_use" => Self::ToolUse,
            "max_tokens" => Self::MaxTokens,
            "stop_sequence" => Self::StopSequence,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Token usage of one model call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Ordered content blocks (text and/or tool invocations)
    pub content: Vec<ContentBlock>,

    /// Why generation stopped
    pub stop_reason: StopReason,

    /// Token usage statistics
    pub usage: Usage,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

impl ProviderResponse {
    /// Text content of the response, text blocks joined with newlines.
    pub fn text(&self) -> String {
        message::blocks_text(&self.content)
    }

    /// Tool invocations requested by the model, in request order.
    pub fn tool_invocations(&self) -> Vec<ToolInvocation> {
        message::blocks_tool_invocations(&self.content)
    }

    /// The response as an assistant message to append to the conversation.
    pub fn into_message(self) -> Message {
        Message::new(Role::Assistant, self.content)
    }
}

/// The core Provider trait.
///
/// The orchestration loop calls `complete()` without knowing which backend
/// is behind it. Implementations must report authentication failures as
/// [`ProviderError::AuthenticationFailed`] and throttling as
/// [`ProviderError::RateLimited`].
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "anthropic").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Health check: can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}
