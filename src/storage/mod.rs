//! Blob storage abstraction: binary objects addressed by slash-separated
//! paths, each reachable through a public URL.

pub mod gcs;
pub mod memory;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::firebase::FirebaseError;

pub use gcs::CloudStorage;
pub use memory::MemoryBlobStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Firebase(#[from] FirebaseError),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` at `path`, readable by anyone, and return its public URL.
    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> Result<String, StorageError>;

    /// Paths of every object whose path starts with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Deleting an absent object succeeds.
    async fn delete(&self, path: &str) -> Result<(), StorageError>;

    async fn get(&self, path: &str) -> Result<Option<Bytes>, StorageError>;
}
