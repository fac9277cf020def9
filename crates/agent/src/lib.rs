//! The turn loop: the heart of hubpilot.
//!
//! Each user turn follows an **Assemble → Call → Dispatch** cycle:
//!
//! 1. **Assemble** the system prompt (instructions + session context),
//!    the windowed history and the new user message with attachments
//! 2. **Call** the model with the tool catalog
//! 3. **Dispatch** any requested tools in order and send every result
//!    back in one message, then loop to step 2
//!
//! The loop ends when the model answers without tools or the iteration
//! cap is reached.

pub mod builder;
pub mod context;
pub mod loop_runner;
pub mod prompt;
pub mod usage;

#[cfg(test)]
mod test_helpers;

pub use builder::{
    BuildError, Collaborators, build_from_config, build_with_collaborators, build_with_provider,
    open_storage,
};
pub use context::{AssembledTurn, MessageAssembler};
pub use loop_runner::{CAP_NOTICE, Decision, SalesAgent, TurnError, TurnRequest, decide};
pub use usage::{TurnAccumulator, TurnResult, TurnUsage};
