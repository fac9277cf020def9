//! Error types for the hubpilot domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

// --- Bounded context errors ---

/// Failures of a model call.
///
/// Authentication and rate limiting are kept apart from everything else so
/// the route layer can tell "configuration error" from "try again shortly".
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Failures inside a tool handler.
///
/// These never abort a turn: the dispatcher turns each one into a
/// structured payload via [`ToolError::to_payload`] and hands it back to
/// the model.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("{tool} is not configured: {reason}")]
    NotConfigured {
        tool: String,
        reason: String,
        suggestion: String,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("{tool} failed: {reason}")]
    Upstream { tool: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ToolError {
    /// The JSON object sent back to the model in place of a tool result.
    pub fn to_payload(&self) -> serde_json::Value {
        match self {
            Self::NotConfigured { suggestion, .. } => serde_json::json!({
                "error": self.to_string(),
                "suggestion": suggestion,
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        }
    }
}

/// Failures of the external stores (conversation, inventory, blobs).
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<StoreError> for ToolError {
    fn from(e: StoreError) -> Self {
        Self::Storage(e.to_string())
    }
}
