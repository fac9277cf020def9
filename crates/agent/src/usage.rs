//! Per-turn accounting of tokens, model calls and generated files.

use hubpilot_core::{GeneratedArtifact, ProviderResponse, ToolResult};
use serde::{Deserialize, Serialize};

/// Token usage summed over every model call of a turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub model_calls: u32,
}

impl TurnUsage {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// The outcome of a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResult {
    /// Final assistant text
    pub text: String,
    pub usage: TurnUsage,
    /// Files created during the turn, in creation order
    pub artifacts: Vec<GeneratedArtifact>,
    /// Whether the turn stopped at the iteration cap
    pub cap_reached: bool,
    /// Model that produced the last response
    pub model: String,
}

#[derive(Debug, Default)]
pub struct TurnAccumulator {
    usage: TurnUsage,
    artifacts: Vec<GeneratedArtifact>,
    model: String,
}

impl TurnAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one model call.
    pub fn record_response(&mut self, response: &ProviderResponse) {
        self.usage.input_tokens += u64::from(response.usage.input_tokens);
        self.usage.output_tokens += u64::from(response.usage.output_tokens);
        self.usage.model_calls += 1;
        self.model.clone_from(&response.model);
    }

    /// Keep the artifacts of successful tool calls.
    pub fn record_results(&mut self, results: &[ToolResult]) {
        self.artifacts.extend(
            results
                .iter()
                .filter(|r| !r.is_error)
                .filter_map(|r| r.artifact.clone()),
        );
    }

    pub fn usage(&self) -> TurnUsage {
        self.usage
    }

    pub fn finish(self, text: String, cap_reached: bool) -> TurnResult {
        TurnResult {
            text,
            usage: self.usage,
            artifacts: self.artifacts,
            cap_reached,
            model: self.model,
        }
    }
}
