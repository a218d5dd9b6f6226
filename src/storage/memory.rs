//! In-memory blob store
//!
//! The default backend: a process-local object map. Useful for single-node
//! deployments and tests; durability comes from swapping in a real backend
//! behind the same trait.

use super::{BlobStore, ObjectMeta, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    last_modified: DateTime<Utc>,
}

/// Process-local blob store
#[derive(Clone)]
pub struct MemoryBlobStore {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of stored objects
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let objects = self.objects.read().await;
        Ok(objects.get(key).map(|o| o.bytes.clone()))
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let mut objects = self.objects.write().await;
        objects.insert(
            key.to_string(),
            StoredObject {
                bytes,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, StorageError> {
        let objects = self.objects.read().await;
        let mut metas: Vec<ObjectMeta> = objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| ObjectMeta {
                key: key.clone(),
                last_modified: object.last_modified,
            })
            .collect();
        metas.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(metas)
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}
