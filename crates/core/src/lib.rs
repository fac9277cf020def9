//! # hubpilot Core
//!
//! Domain types, collaborator traits, and error definitions for the hubpilot
//! sales assistant. This crate has **no framework dependencies**: it defines
//! the domain model that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (model, conversation store, inventory, blob
//! storage) is a trait here. Implementations live in their own crates, so
//! - production and test wiring differ only in what gets injected
//! - the orchestration loop never talks to a database or HTTP API directly

pub mod artifact;
pub mod attachment;
pub mod error;
pub mod event;
pub mod inventory;
pub mod message;
pub mod provider;
pub mod session;
pub mod store;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use artifact::{ArtifactKind, GeneratedArtifact};
pub use attachment::Attachment;
pub use error::{ProviderError, StoreError, ToolError};
pub use event::{DomainEvent, EventBus};
pub use inventory::{Offering, Publication};
pub use message::{ContentBlock, Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, StopReason, Usage};
pub use session::SessionContext;
pub use store::{BlobStorage, ConversationStore, InventoryStore};
pub use tool::{
    ToolContext, ToolDefinition, ToolHandler, ToolInvocation, ToolName, ToolOutput, ToolResult,
};
