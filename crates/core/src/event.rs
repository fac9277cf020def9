//! Domain events published while a turn runs.
//!
//! The orchestration loop publishes an event at each step; anything that
//! wants to observe turns (audit logging, the gateway, tests) subscribes
//! without the loop knowing about it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A turn began
    TurnStarted {
        conversation_id: String,
        user_id: String,
        attachments: usize,
        timestamp: DateTime<Utc>,
    },

    /// The model answered one round trip
    ModelResponded {
        conversation_id: String,
        model: String,
        iteration: u32,
        input_tokens: u32,
        output_tokens: u32,
        tool_calls: usize,
        timestamp: DateTime<Utc>,
    },

    /// A tool was dispatched
    ToolExecuted {
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A tool produced a durable file
    ArtifactCreated {
        conversation_id: String,
        artifact_id: String,
        filename: String,
        timestamp: DateTime<Utc>,
    },

    /// The loop hit its iteration cap without a final answer
    IterationCapReached {
        conversation_id: String,
        iterations: u32,
        timestamp: DateTime<Utc>,
    },

    /// A turn finished
    TurnCompleted {
        conversation_id: String,
        model_calls: u32,
        total_tokens: u64,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
