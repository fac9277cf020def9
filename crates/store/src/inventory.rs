//! Hub inventory held in memory, optionally seeded from a JSON file.
//!
//! File format: an object mapping hub id to a list of publications.
//!
//! ```json
//! { "hub-1": [ { "publisherId": "pub-1", "name": "Riverside Gazette", "channels": ["print"] } ] }
//! ```

use async_trait::async_trait;
use hubpilot_core::error::StoreError;
use hubpilot_core::inventory::Publication;
use hubpilot_core::store::InventoryStore;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct InMemoryInventory {
    hubs: HashMap<String, Vec<Publication>>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a hub's publications.
    pub fn with_hub(mut self, hub_id: impl Into<String>, publications: Vec<Publication>) -> Self {
        self.hubs.insert(hub_id.into(), publications);
        self
    }

    pub fn load_from_file(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StoreError::Unavailable(format!("Failed to read {}: {e}", path.display()))
        })?;
        let hubs: HashMap<String, Vec<Publication>> = serde_json::from_str(&content)?;
        info!(
            path = %path.display(),
            hubs = hubs.len(),
            publications = hubs.values().map(Vec::len).sum::<usize>(),
            "Inventory loaded"
        );
        Ok(Self { hubs })
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventory {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn list_publications(&self, hub_id: &str) -> Result<Vec<Publication>, StoreError> {
        Ok(self.hubs.get(hub_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn unknown_hub_is_empty() {
        let inv = InMemoryInventory::new();
        assert!(inv.list_publications("hub-x").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn loads_hubs_from_json() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"{{"hub-1": [{{"publisherId": "pub-1", "name": "Riverside Gazette", "channels": ["print"]}}]}}"#
        )
        .unwrap();

        let inv = InMemoryInventory::load_from_file(tmp.path()).unwrap();
        let pubs = inv.list_publications("hub-1").await.unwrap();
        assert_eq!(pubs.len(), 1);
        assert_eq!(pubs[0].name, "Riverside Gazette");
        assert!(pubs[0].offerings.is_empty());
    }

    #[test]
    fn malformed_file_is_serialization_error() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "[not a map]").unwrap();
        let err = InMemoryInventory::load_from_file(tmp.path()).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
