//! Object Storage Module
//!
//! Durable blob storage behind a narrow interface. Contract versions, the
//! version pointer, transform scripts, and patch proposals all live here as
//! plain objects, so swapping the backend never touches the pipeline.

pub mod memory;

pub use memory::MemoryBlobStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors surfaced by a storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("backend failure: {0}")]
    Backend(String),
}

/// Metadata about a stored object
#[derive(Debug, Clone)]
pub struct ObjectMeta {
    pub key: String,
    pub last_modified: DateTime<Utc>,
}

/// Minimal blob storage interface
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch an object's bytes, `None` when the key does not exist
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Write an object, replacing any previous content at the key
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError>;

    /// List objects whose keys start with `prefix`
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, StorageError>;
}
