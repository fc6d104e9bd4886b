//! Image uploads for resources that own a folder of public images.

use bytes::Bytes;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::storage::{BlobStore, StorageError};

const MAX_STEM_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub url: String,
    pub path: String,
}

#[derive(Clone)]
pub struct ImageStore {
    blobs: Arc<dyn BlobStore>,
}

impl ImageStore {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    /// Upload `data` to `<prefix>/<filename>`.
    pub async fn upload(
        &self,
        prefix: &str,
        filename: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<UploadedImage, StorageError> {
        let path = format!("{}/{}", prefix.trim_end_matches('/'), filename);
        let url = self.blobs.put(&path, data, content_type).await?;
        debug!("stored image {}", path);
        Ok(UploadedImage { url, path })
    }

    /// Delete every object under `prefix`, returning how many were removed.
    /// Objects that fail to delete are logged and skipped.
    pub async fn delete_by_prefix(&self, prefix: &str) -> Result<usize, StorageError> {
        let folder = format!("{}/", prefix.trim_end_matches('/'));
        let paths = self.blobs.list(&folder).await?;

        let results = join_all(paths.iter().map(|p| self.blobs.delete(p))).await;

        let mut deleted = 0;
        for (path, result) in paths.iter().zip(results) {
            match result {
                Ok(()) => deleted += 1,
                Err(e) => warn!("failed to delete {}: {}", path, e),
            }
        }

        Ok(deleted)
    }
}

/// Unique, storage-safe object name for an uploaded file:
/// `<sanitized stem>-<8 hex>.<ext>`.
pub fn object_name(original: Option<&str>, content_type: Option<&str>) -> String {
    let original = original.unwrap_or("").trim();
    let base = original.rsplit(['/', '\\']).next().unwrap_or("");

    let (stem, ext) = match base.rsplit_once('.') {
        Some((s, e)) if !s.is_empty() && !e.is_empty() => (s, Some(e)),
        _ => (base, None),
    };

    let mut stem: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .take(MAX_STEM_LEN)
        .collect();
    if stem.trim_matches(|c| c == '_' || c == '.').is_empty() {
        stem = "image".to_string();
    }

    let ext = ext
        .map(sanitize_extension)
        .filter(|e| !e.is_empty())
        .or_else(|| content_type.and_then(extension_for).map(str::to_string))
        .unwrap_or_else(|| "bin".to_string());

    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}.{}", stem, &suffix[..8], ext)
}

fn sanitize_extension(ext: &str) -> String {
    ext.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(10)
        .collect::<String>()
        .to_ascii_lowercase()
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or("").trim();
    match essence.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/svg+xml" => Some("svg"),
        "image/bmp" => Some("bmp"),
        "image/tiff" => Some("tiff"),
        "image/heic" => Some("heic"),
        "image/avif" => Some("avif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBlobStore;

    fn split(name: &str) -> (&str, &str, &str) {
        let (rest, ext) = name.rsplit_once('.').unwrap();
        let (stem, suffix) = rest.rsplit_once('-').unwrap();
        (stem, suffix, ext)
    }

    #[test]
    fn keeps_safe_names_and_adds_suffix() {
        let name = object_name(Some("beach-view_01.JPG"), Some("image/jpeg"));
        let (stem, suffix, ext) = split(&name);
        assert_eq!(stem, "beach-view_01");
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(ext, "jpg");
    }

    #[test]
    fn replaces_unsafe_characters() {
        let name = object_name(Some("my photo (1)&.png"), None);
        assert!(name.starts_with("my_photo__1__-"), "{}", name);
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn strips_directories_from_client_names() {
        let name = object_name(Some("../../etc/passwd.png"), None);
        assert!(name.starts_with("passwd-"), "{}", name);
    }

    #[test]
    fn truncates_long_stems() {
        let long = format!("{}.webp", "a".repeat(200));
        let name = object_name(Some(&long), None);
        let (stem, _, ext) = split(&name);
        assert_eq!(stem.len(), 64);
        assert_eq!(ext, "webp");
    }

    #[test]
    fn falls_back_to_defaults() {
        let name = object_name(None, None);
        let (stem, _, ext) = split(&name);
        assert_eq!((stem, ext), ("image", "bin"));

        let name = object_name(Some("???"), Some("image/png; charset=binary"));
        let (stem, _, ext) = split(&name);
        assert_eq!((stem, ext), ("image", "png"));
    }

    #[test]
    fn names_are_unique() {
        assert_ne!(object_name(Some("a.png"), None), object_name(Some("a.png"), None));
    }

    #[tokio::test]
    async fn upload_places_object_under_prefix() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let images = ImageStore::new(blobs.clone());

        let uploaded = images
            .upload("hospitality/h1", "a-12345678.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();

        assert_eq!(uploaded.path, "hospitality/h1/a-12345678.png");
        assert_eq!(uploaded.url, "memory://hospitality/h1/a-12345678.png");
        assert_eq!(blobs.object(&uploaded.path).await.unwrap().content_type, "image/png");
    }

    #[tokio::test]
    async fn delete_by_prefix_only_touches_that_folder() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let images = ImageStore::new(blobs.clone());
        for path in ["hospitality/h1/a.png", "hospitality/h1/b.png", "hospitality/h10/c.png"] {
            blobs.put(path, Bytes::from_static(b"x"), "image/png").await.unwrap();
        }

        let deleted = images.delete_by_prefix("hospitality/h1").await.unwrap();

        assert_eq!(deleted, 2);
        assert_eq!(blobs.paths().await, vec!["hospitality/h10/c.png"]);
        assert_eq!(images.delete_by_prefix("hospitality/h1").await.unwrap(), 0);
    }
}
