//! Tools for the hubpilot sales assistant.
//!
//! Four tools give the model its reach beyond the conversation:
//! web search for prospect research, the hub's inventory, the session
//! context, and file generation. [`ToolDispatcher`] routes each model
//! invocation to its handler and always returns a well-formed result.

pub mod catalog;
pub mod dispatcher;
pub mod generate_file;
pub mod inventory;
pub mod update_context;
pub mod web_search;

pub use catalog::tool_catalog;
pub use dispatcher::ToolDispatcher;
pub use generate_file::GenerateFileHandler;
pub use inventory::InventoryHandler;
pub use update_context::UpdateContextHandler;
pub use web_search::{PerplexitySearch, SearchAnswer, SearchBackend, Source, WebSearchHandler};
