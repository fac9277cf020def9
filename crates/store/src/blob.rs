//! Blob storage for generated files and uploaded attachments.

use async_trait::async_trait;
use hubpilot_core::error::StoreError;
use hubpilot_core::store::BlobStorage;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::check_key;

/// Blobs kept in a map. Content types are retained for inspection.
#[derive(Default)]
pub struct InMemoryBlobStorage {
    blobs: Arc<RwLock<HashMap<String, (Vec<u8>, String)>>>,
}

impl InMemoryBlobStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn content_type(&self, key: &str) -> Option<String> {
        self.blobs.read().await.get(key).map(|(_, ct)| ct.clone())
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.blobs.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl BlobStorage for InMemoryBlobStorage {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        check_key(key)?;
        self.blobs
            .write()
            .await
            .insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.blobs
            .read()
            .await
            .get(key)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.blobs.write().await.remove(key);
        Ok(())
    }
}

/// Blobs as plain files under a root directory (default `~/.hubpilot/files`).
pub struct FsBlobStorage {
    root: PathBuf,
}

impl FsBlobStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl BlobStorage for FsBlobStorage {
    fn name(&self) -> &str {
        "file"
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        check_key(key)?;
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::WriteFailed(format!("Failed to create {}: {e}", parent.display())))?;
        }
        let size = bytes.len();
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StoreError::WriteFailed(format!("Failed to write {key}: {e}")))?;
        debug!(key, size, content_type, "Blob written");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        check_key(key).map_err(|_| StoreError::NotFound(key.to_string()))?;
        match tokio::fs::read(self.root.join(key)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(key.to_string()))
            }
            Err(e) => Err(StoreError::Unavailable(format!("Failed to read {key}: {e}"))),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        check_key(key)?;
        match tokio::fs::remove_file(self.root.join(key)).await {
            Ok(()) => {
                debug!(key, "Blob deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::WriteFailed(format!("Failed to delete {key}: {e}"))),
        }
    }
}
