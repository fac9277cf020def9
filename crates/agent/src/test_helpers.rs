//! Shared test helpers for loop tests.

use hubpilot_core::error::ProviderError;
use hubpilot_core::provider::{Provider, ProviderRequest, ProviderResponse, StopReason, Usage};
use hubpilot_core::ContentBlock;
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted outcomes.
///
/// Each call to `complete` returns the next outcome in the queue and
/// records the request it was given. Panics if more calls are made than
/// outcomes provided.
pub struct SequentialMockProvider {
    outcomes: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self::with_outcomes(responses.into_iter().map(Ok).collect())
    }

    pub fn with_outcomes(outcomes: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let outcomes = self.outcomes.lock().unwrap();
        let call = requests.len();
        if call >= outcomes.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{call}, have {})",
                outcomes.len()
            );
        }
        requests.push(request);
        outcomes[call].clone()
    }
}

/// A final text response (no tool calls).
pub fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        content: vec![ContentBlock::text(text)],
        stop_reason: StopReason::EndTurn,
        usage: Usage {
            input_tokens: 10,
            output_tokens: 5,
        },
        model: "mock-model".into(),
    }
}

/// A response requesting the given `(id, tool, input)` calls.
pub fn tool_response(thought: &str, calls: &[(&str, &str, serde_json::Value)]) -> ProviderResponse {
    let mut content = Vec::new();
    if !thought.is_empty() {
        content.push(ContentBlock::text(thought));
    }
    content.extend(calls.iter().map(|(id, name, input)| ContentBlock::ToolUse {
        id: id.to_string(),
        name: name.to_string(),
        input: input.clone(),
    }));
    ProviderResponse {
        content,
        stop_reason: StopReason::ToolUse,
        usage: Usage {
            input_tokens: 20,
            output_tokens: 10,
        },
        model: "mock-model".into(),
    }
}
