#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceExt;

use sih_backend::auth::StaticTokenVerifier;
use sih_backend::config::AppConfig;
use sih_backend::llm::{LanguageModel, LlmError};
use sih_backend::storage::MemoryBlobStore;
use sih_backend::store::{DocumentStore, FieldValue, Fields, MemoryStore};
use sih_backend::{app, AppState};

pub const ALICE: &str = "alice-token";
pub const BOB: &str = "bob-token";
pub const ADMIN: &str = "admin-token";
pub const SYSTEM_PROMPT: &str = "You are the test concierge.";

const BOUNDARY: &str = "sih-test-boundary";

/// Replies with a fixed message and remembers every prompt it was given.
#[derive(Default)]
pub struct ScriptedModel {
    pub prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let mut prompts = self.prompts.lock().await;
        prompts.push(prompt.to_string());
        Ok(format!("reply #{}", prompts.len()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub model: Arc<ScriptedModel>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(AppConfig::development()).await
    }

    /// Listing writes require an admin caller.
    pub async fn admin_only() -> Self {
        let mut config = AppConfig::development();
        config.security.hospitality_admin_only = true;
        Self::with_config(config).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let model = Arc::new(ScriptedModel::default());

        let verifier = StaticTokenVerifier::new()
            .with_token(ALICE, "alice", Some("alice@example.com"))
            .with_token(BOB, "bob", None)
            .with_token(ADMIN, "admin-uid", Some("admin@example.com"));

        let mut admin = Fields::new();
        admin.insert("type".to_string(), FieldValue::from("admin"));
        admin.insert("email".to_string(), FieldValue::from("admin@example.com"));
        store
            .create("users", "admin-uid", admin)
            .await
            .expect("seed admin profile");

        let state = AppState::new(
            config,
            store.clone(),
            blobs.clone(),
            Arc::new(verifier),
            model.clone(),
            SYSTEM_PROMPT,
        );

        Self {
            router: app(state),
            store,
            blobs,
            model,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        send(&self.router, request).await
    }
}

/// Send one request and decode the JSON body (Null when empty).
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, body)
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    request("GET", uri, token, None, Body::empty())
}

pub fn delete(uri: &str, token: Option<&str>) -> Request<Body> {
    request("DELETE", uri, token, None, Body::empty())
}

pub fn json(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    request(
        method,
        uri,
        token,
        Some("application/json".to_string()),
        Body::from(body.to_string()),
    )
}

pub fn multipart(method: &str, uri: &str, token: Option<&str>, form: MultipartForm) -> Request<Body> {
    request(
        method,
        uri,
        token,
        Some(format!("multipart/form-data; boundary={}", BOUNDARY)),
        Body::from(form.finish()),
    )
}

fn request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    content_type: Option<String>,
    body: Body,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(body).expect("valid request")
}

/// Minimal multipart/form-data encoder.
#[derive(Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, filename, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }
}
