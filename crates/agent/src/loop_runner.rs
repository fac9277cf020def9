//! The turn orchestration loop.

use std::sync::Arc;

use chrono::Utc;
use hubpilot_core::error::{ProviderError, StoreError};
use hubpilot_core::event::{DomainEvent, EventBus};
use hubpilot_core::message::Message;
use hubpilot_core::provider::{Provider, ProviderRequest, ProviderResponse, StopReason};
use hubpilot_core::store::ConversationStore;
use hubpilot_core::tool::{ToolContext, ToolInvocation};
use hubpilot_core::Attachment;
use hubpilot_tools::ToolDispatcher;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::context::MessageAssembler;
use crate::usage::{TurnAccumulator, TurnResult};

/// Returned when the iteration cap is hit and the last response had no text.
pub const CAP_NOTICE: &str = "I've gathered a lot of information but ran out of steps for this \
request. Let me know which part you'd like me to focus on and I'll continue from there.";

const DEFAULT_MAX_TOKENS: u32 = 4096;

/// One user turn, as received from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    /// Hub whose inventory the conversation sells
    pub tenant_id: String,
    pub conversation_id: String,
    pub user_id: String,
    pub message: String,
    /// Prior messages, oldest first
    #[serde(default)]
    pub history: Vec<Message>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Failures that abort a turn.
///
/// Tool failures never appear here; they are returned to the model.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("Model authentication failed: {0}")]
    Authentication(String),

    #[error("Model rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Model call failed: {0}")]
    Model(String),

    #[error("Conversation store failed: {0}")]
    Store(#[from] StoreError),
}

impl From<ProviderError> for TurnError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::AuthenticationFailed(msg) => Self::Authentication(msg),
            ProviderError::NotConfigured(msg) => Self::Authentication(msg),
            ProviderError::RateLimited { retry_after_secs } => Self::RateLimited { retry_after_secs },
            other => Self::Model(other.to_string()),
        }
    }
}

/// What the loop does with a model response.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The response is the final answer
    Finish,
    /// Run these invocations, in order, and call the model again
    Dispatch(Vec<ToolInvocation>),
}

/// Decide whether a response ends the turn.
///
/// A response with no tool invocations is final. A response that ends
/// its turn with non-empty text is also final, even if it carries
/// invocations. A response with only invocations is always dispatched.
pub fn decide(response: &ProviderResponse) -> Decision {
    let invocations = response.tool_invocations();
    if invocations.is_empty() {
        return Decision::Finish;
    }
    if response.stop_reason == StopReason::EndTurn && !response.text().trim().is_empty() {
        warn!(
            ignored = invocations.len(),
            "Model ended its turn with text, ignoring tool invocations"
        );
        return Decision::Finish;
    }
    Decision::Dispatch(invocations)
}

/// The sales assistant: assembles context, calls the model and runs tools
/// until the model produces a final answer or the iteration cap is hit.
pub struct SalesAgent {
    /// The model provider
    provider: Arc<dyn Provider>,

    /// Routes tool invocations to handlers
    dispatcher: Arc<ToolDispatcher>,

    /// Source of the session context
    conversations: Arc<dyn ConversationStore>,

    assembler: MessageAssembler,

    model: String,
    max_tokens: u32,
    temperature: f32,

    /// Maximum model round trips per turn
    max_iterations: u32,

    event_bus: Arc<EventBus>,
}

impl SalesAgent {
    pub fn new(
        provider: Arc<dyn Provider>,
        dispatcher: Arc<ToolDispatcher>,
        conversations: Arc<dyn ConversationStore>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            dispatcher,
            conversations,
            assembler: MessageAssembler::new(20),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: 0.7,
            max_iterations: 5,
            event_bus: Arc::new(EventBus::default()),
        }
    }

    /// Set the maximum number of model round trips per turn (at least 1).
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_assembler(mut self, assembler: MessageAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        self.event_bus.clone()
    }

    pub fn provider(&self) -> Arc<dyn Provider> {
        self.provider.clone()
    }

    pub fn dispatcher(&self) -> Arc<ToolDispatcher> {
        self.dispatcher.clone()
    }

    pub fn conversations(&self) -> Arc<dyn ConversationStore> {
        self.conversations.clone()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one user turn to completion.
    ///
    /// 1. Read the session context and assemble the model input
    /// 2. Call the model
    /// 3. If it requests tools, run them in order, send all results back
    ///    in one message and go to 2
    /// 4. Return the final text with usage and artifacts
    pub async fn run_turn(&self, request: TurnRequest) -> Result<TurnResult, TurnError> {
        let conversation_id = request.conversation_id.clone();
        info!(
            conversation_id = %conversation_id,
            tenant_id = %request.tenant_id,
            history = request.history.len(),
            attachments = request.attachments.len(),
            "Processing turn"
        );
        self.event_bus.publish(DomainEvent::TurnStarted {
            conversation_id: conversation_id.clone(),
            user_id: request.user_id.clone(),
            attachments: request.attachments.len(),
            timestamp: Utc::now(),
        });

        let context = self
            .conversations
            .read_context(&request.conversation_id, &request.user_id)
            .await?;
        let assembled = self
            .assembler
            .assemble(&context, &request.history, &request.message, &request.attachments)
            .await;
        if !assembled.skipped_attachments.is_empty() {
            warn!(
                conversation_id = %conversation_id,
                skipped = ?assembled.skipped_attachments,
                "Some attachments were not sent to the model"
            );
        }

        let tool_ctx = ToolContext {
            tenant_id: request.tenant_id,
            conversation_id: request.conversation_id,
            user_id: request.user_id,
        };
        let tools = self.dispatcher.definitions();
        let mut messages = assembled.messages;
        let mut acc = TurnAccumulator::new();
        let mut last_text = String::new();

        for iteration in 1..=self.max_iterations {
            debug!(conversation_id = %conversation_id, iteration, "Calling model");

            let response = self
                .provider
                .complete(ProviderRequest {
                    model: self.model.clone(),
                    system: assembled.system.clone(),
                    messages: messages.clone(),
                    tools: tools.clone(),
                    max_tokens: self.max_tokens,
                    temperature: self.temperature,
                })
                .await
                .map_err(|e| {
                    warn!(conversation_id = %conversation_id, iteration, error = %e, "Model call failed");
                    TurnError::from(e)
                })?;

            acc.record_response(&response);
            let decision = decide(&response);
            self.event_bus.publish(DomainEvent::ModelResponded {
                conversation_id: conversation_id.clone(),
                model: response.model.clone(),
                iteration,
                input_tokens: response.usage.input_tokens,
                output_tokens: response.usage.output_tokens,
                tool_calls: match &decision {
                    Decision::Finish => 0,
                    Decision::Dispatch(calls) => calls.len(),
                },
                timestamp: Utc::now(),
            });

            let invocations = match decision {
                Decision::Finish => {
                    let text = response.text();
                    return Ok(self.complete_turn(&conversation_id, acc, text, false));
                }
                Decision::Dispatch(invocations) => invocations,
            };

            debug!(
                conversation_id = %conversation_id,
                iteration,
                tools = invocations.len(),
                "Dispatching tool invocations"
            );
            let mut results = Vec::with_capacity(invocations.len());
            for invocation in &invocations {
                results.push(self.dispatcher.dispatch(&tool_ctx, invocation).await);
            }
            acc.record_results(&results);

            last_text = response.text();
            messages.push(response.into_message());
            messages.push(Message::tool_results(&results));
        }

        warn!(
            conversation_id = %conversation_id,
            iterations = self.max_iterations,
            "Iteration cap reached without a final answer"
        );
        self.event_bus.publish(DomainEvent::IterationCapReached {
            conversation_id: conversation_id.clone(),
            iterations: self.max_iterations,
            timestamp: Utc::now(),
        });

        let text = if last_text.trim().is_empty() {
            CAP_NOTICE.to_string()
        } else {
            last_text
        };
        Ok(self.complete_turn(&conversation_id, acc, text, true))
    }

    fn complete_turn(
        &self,
        conversation_id: &str,
        acc: TurnAccumulator,
        text: String,
        cap_reached: bool,
    ) -> TurnResult {
        let result = acc.finish(text, cap_reached);
        info!(
            conversation_id = %conversation_id,
            model_calls = result.usage.model_calls,
            input_tokens = result.usage.input_tokens,
            output_tokens = result.usage.output_tokens,
            artifacts = result.artifacts.len(),
            cap_reached,
            "Turn complete"
        );
        self.event_bus.publish(DomainEvent::TurnCompleted {
            conversation_id: conversation_id.to_string(),
            model_calls: result.usage.model_calls,
            total_tokens: result.usage.total_tokens(),
            timestamp: Utc::now(),
        });
        result
    }
}
