//! Cloud Storage JSON API implementation of [`BlobStore`].

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::{BlobStore, StorageError};
use crate::firebase::{error_message, ServiceCredentials};

const STORAGE_HOST: &str = "https://storage.googleapis.com";

pub struct CloudStorage {
    client: Client,
    base_url: String,
    bucket: Option<String>,
    credentials: Arc<dyn ServiceCredentials>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListObjectsResponse {
    #[serde(default)]
    items: Vec<ObjectResource>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectResource {
    name: String,
}

impl CloudStorage {
    /// `bucket` defaults to `<project>.appspot.com` when not given.
    pub fn new(credentials: Arc<dyn ServiceCredentials>, bucket: Option<String>) -> Self {
        Self::with_base_url(credentials, bucket, STORAGE_HOST)
    }

    pub fn with_base_url(
        credentials: Arc<dyn ServiceCredentials>,
        bucket: Option<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket,
            credentials,
        }
    }

    async fn bucket(&self) -> Result<String, StorageError> {
        match &self.bucket {
            Some(b) => Ok(b.clone()),
            None => Ok(format!("{}.appspot.com", self.credentials.project_id().await?)),
        }
    }

    async fn token(&self) -> Result<String, StorageError> {
        Ok(self.credentials.access_token().await?)
    }

    async fn object_url(&self, path: &str) -> Result<String, StorageError> {
        let encoded = url::form_urlencoded::byte_serialize(path.as_bytes()).collect::<String>();
        Ok(format!("{}/storage/v1/b/{}/o/{}", self.base_url, self.bucket().await?, encoded))
    }
}

#[async_trait]
impl BlobStore for CloudStorage {
    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> Result<String, StorageError> {
        let bucket = self.bucket().await?;
        let url = format!("{}/upload/storage/v1/b/{}/o", self.base_url, bucket);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.token().await?)
            .query(&[
                ("uploadType", "media"),
                ("name", path),
                ("predefinedAcl", "publicRead"),
            ])
            .header(header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::Api(error_message(response, "Upload failed").await));
        }

        debug!("uploaded gs://{}/{}", bucket, path);
        Ok(format!("{}/{}/{}", self.base_url, bucket, path))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let url = format!("{}/storage/v1/b/{}/o", self.base_url, self.bucket().await?);
        let token = self.token().await?;
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("prefix", prefix.to_string())];
            if let Some(t) = page_token.take() {
                query.push(("pageToken", t));
            }

            let response = self.client.get(&url).bearer_auth(&token).query(&query).send().await?;

            if !response.status().is_success() {
                return Err(StorageError::Api(error_message(response, "List objects failed").await));
            }

            let page: ListObjectsResponse = response.json().await?;
            names.extend(page.items.into_iter().map(|o| o.name));

            match page.next_page_token {
                Some(t) if !t.is_empty() => page_token = Some(t),
                _ => break,
            }
        }

        Ok(names)
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let url = self.object_url(path).await?;
        let response = self.client.delete(&url).bearer_auth(self.token().await?).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(StorageError::Api(error_message(response, "Delete failed").await));
        }

        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<Bytes>, StorageError> {
        let url = self.object_url(path).await?;
        let response = self
            .client
            .get(&url)
            .bearer_auth(self.token().await?)
            .query(&[("alt", "media")])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(StorageError::Api(error_message(response, "Download failed").await));
        }

        Ok(Some(response.bytes().await?))
    }
}
