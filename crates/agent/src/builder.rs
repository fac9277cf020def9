//! Wire a [`SalesAgent`] from configuration.

use std::sync::Arc;
use std::time::Duration;

use hubpilot_config::AppConfig;
use hubpilot_core::error::{ProviderError, StoreError, ToolError};
use hubpilot_core::event::EventBus;
use hubpilot_core::store::{BlobStorage, ConversationStore, InventoryStore};
use hubpilot_core::Provider;
use hubpilot_store::{
    FileConversationStore, FsBlobStorage, InMemoryBlobStorage, InMemoryConversationStore,
    InMemoryInventory,
};
use hubpilot_tools::{PerplexitySearch, ToolDispatcher};
use thiserror::Error;
use tracing::{info, warn};

use crate::context::MessageAssembler;
use crate::loop_runner::SalesAgent;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Failed to open storage: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to configure web search: {0}")]
    Search(#[from] ToolError),

    #[error("Unknown storage backend '{0}' (expected \"file\" or \"memory\")")]
    UnknownBackend(String),
}

/// The collaborators an agent is built from.
#[derive(Clone)]
pub struct Collaborators {
    pub conversations: Arc<dyn ConversationStore>,
    pub inventory: Arc<dyn InventoryStore>,
    pub blobs: Arc<dyn BlobStorage>,
}

/// Open the stores named in `[storage]`.
pub fn open_storage(config: &AppConfig) -> Result<Collaborators, BuildError> {
    let storage = &config.storage;
    let (conversations, blobs): (Arc<dyn ConversationStore>, Arc<dyn BlobStorage>) =
        match storage.backend.as_str() {
            "file" => (
                Arc::new(FileConversationStore::new(storage.resolved_data_dir())),
                Arc::new(FsBlobStorage::new(storage.resolved_blob_dir())),
            ),
            "memory" => (
                Arc::new(InMemoryConversationStore::new()),
                Arc::new(InMemoryBlobStorage::new()),
            ),
            other => return Err(BuildError::UnknownBackend(other.to_string())),
        };

    let inventory = match &storage.inventory_file {
        Some(path) => InMemoryInventory::load_from_file(path)?,
        None => {
            warn!("No inventory_file configured; get_inventory will return empty listings");
            InMemoryInventory::new()
        }
    };

    Ok(Collaborators {
        conversations,
        inventory: Arc::new(inventory),
        blobs,
    })
}

/// Build the agent with the configured provider.
pub fn build_from_config(config: &AppConfig) -> Result<SalesAgent, BuildError> {
    let provider = hubpilot_providers::build_from_config(config)?;
    build_with_provider(config, provider)
}

/// Build the agent around an existing provider.
pub fn build_with_provider(
    config: &AppConfig,
    provider: Arc<dyn Provider>,
) -> Result<SalesAgent, BuildError> {
    build_with_collaborators(config, provider, open_storage(config)?)
}

/// Build the agent around an existing provider and already-open stores.
///
/// Callers that upload attachments keep a handle on `stores.blobs` so the
/// assembler reads what they wrote.
pub fn build_with_collaborators(
    config: &AppConfig,
    provider: Arc<dyn Provider>,
    stores: Collaborators,
) -> Result<SalesAgent, BuildError> {
    let event_bus = Arc::new(EventBus::default());

    let mut dispatcher = ToolDispatcher::new(stores.inventory, stores.conversations.clone())
        .with_blob_storage(stores.blobs.clone(), stores.conversations.clone())
        .with_event_bus(event_bus.clone());
    match &config.search.api_key {
        Some(key) => {
            let search = PerplexitySearch::new(
                key.clone(),
                config.search.base_url.clone(),
                config.search.model.clone(),
                Duration::from_secs(config.search.timeout_secs),
            )?;
            dispatcher = dispatcher.with_search(Arc::new(search));
        }
        None => info!("No search API key configured; web_search will report itself unavailable"),
    }

    let mut assembler =
        MessageAssembler::new(config.agent.history_window).with_blob_storage(stores.blobs);
    if let Some(prompt) = &config.agent.system_prompt_override {
        assembler = assembler.with_base_prompt(prompt.clone());
    }

    info!(
        provider = provider.name(),
        model = %config.model.model,
        storage = %config.storage.backend,
        max_iterations = config.agent.max_iterations,
        "Sales agent ready"
    );

    Ok(SalesAgent::new(
        provider,
        Arc::new(dispatcher),
        stores.conversations,
        config.model.model.clone(),
    )
    .with_max_iterations(config.agent.max_iterations)
    .with_max_tokens(config.model.max_tokens)
    .with_temperature(config.model.temperature)
    .with_assembler(assembler)
    .with_event_bus(event_bus))
}
