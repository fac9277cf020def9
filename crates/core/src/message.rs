//! Message and content-block domain types.
//!
//! A message is an ordered list of content blocks. Text, images and
//! documents come from the user; tool-use blocks come from the model; tool
//! results travel back to the model inside a user-role message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tool::{ToolInvocation, ToolResult};

/// The role of a message sender in a conversation.
///
/// System instructions are not a role here: they travel separately in
/// [`crate::provider::ProviderRequest::system`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user (also carries tool results)
    User,
    /// The model
    Assistant,
}

/// One block of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text
    Text { text: String },

    /// Base64-encoded image for direct model consumption
    Image { media_type: String, data: String },

    /// Base64-encoded document (PDF) for direct model consumption
    Document { media_type: String, data: String },

    /// A tool invocation requested by the model
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },

    /// The outcome of a tool invocation
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// Ordered content blocks
    pub content: Vec<ContentBlock>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message from raw blocks.
    pub fn new(role: Role, content: Vec<ContentBlock>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            timestamp: Utc::now(),
        }
    }

    /// Create a new plain-text user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentBlock::text(text)])
    }

    /// Create a new plain-text assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![ContentBlock::text(text)])
    }

    /// Create the consolidated user message that returns every tool result
    /// of one iteration to the model.
    pub fn tool_results(results: &[ToolResult]) -> Self {
        let blocks = results
            .iter()
            .map(|r| ContentBlock::ToolResult {
                tool_use_id: r.tool_use_id.clone(),
                content: r.content.clone(),
                is_error: r.is_error,
            })
            .collect();
        Self::new(Role::User, blocks)
    }

    /// All text blocks joined with newlines.
    pub fn text(&self) -> String {
        blocks_text(&self.content)
    }

    /// Tool invocations carried by this message, in request order.
    pub fn tool_invocations(&self) -> Vec<ToolInvocation> {
        blocks_tool_invocations(&self.content)
    }
}

/// Join the text blocks of a content list.
pub fn blocks_text(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .filter_map(|b| match b {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract the tool-use blocks of a content list.
pub fn blocks_tool_invocations(blocks: &[ContentBlock]) -> Vec<ToolInvocation> {
    blocks
        .iter()
        .filter_map(|b| match b {
            ContentBlock::ToolUse { id, name, input } => Some(ToolInvocation {
                id: id.clone(),
                name: name.clone(),
                input: input.clone(),
            }),
            _ => None,
        })
        .collect()
}
