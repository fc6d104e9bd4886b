use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{BlobStore, StorageError};

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

/// In-process blob store. Paths listed in `fail_on` reject uploads, which lets
/// tests exercise partial-failure handling.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    fail_on: RwLock<Vec<String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every upload whose path contains `fragment` fail.
    pub async fn fail_uploads_matching(&self, fragment: &str) {
        self.fail_on.write().await.push(fragment.to_string());
    }

    pub async fn paths(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    pub async fn object(&self, path: &str) -> Option<StoredObject> {
        self.objects.read().await.get(path).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> Result<String, StorageError> {
        if self.fail_on.read().await.iter().any(|f| path.contains(f.as_str())) {
            return Err(StorageError::Api(format!("Upload failed for {}", path)));
        }

        self.objects.write().await.insert(
            path.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );

        Ok(format!("memory://{}", path))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .objects
            .read()
            .await
            .keys()
            .filter(|p| p.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.objects.write().await.remove(path);
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<Bytes>, StorageError> {
        Ok(self.objects.read().await.get(path).map(|o| o.data.clone()))
    }
}
