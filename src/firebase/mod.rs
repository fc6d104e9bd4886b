//! Firebase project access shared by the Firestore, Cloud Storage and
//! ID-token adapters.
//!
//! Initialization is split in two phases. [`FirebaseApp::configure`] only
//! records the configuration and never fails, so the server starts even
//! without credentials. [`FirebaseApp::ensure_ready`] loads the service
//! account key on first use and reports [`FirebaseError::CredentialsMissing`]
//! when none was provided.

pub mod credentials;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{info, warn};
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::ServiceAccountAuthenticator;

use crate::config::FirebaseConfig;
use credentials::{CredentialSource, CredentialsError};

const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/cloud-platform",
    "https://www.googleapis.com/auth/firebase",
];

#[derive(Debug, Error)]
pub enum FirebaseError {
    #[error("Firebase credentials not provided. Set FIREBASE_CREDENTIALS, FIREBASE_CREDENTIALS_B64 or FIREBASE_CREDENTIALS_JSON")]
    CredentialsMissing,

    #[error("Firebase credentials invalid: {0}")]
    CredentialsInvalid(#[from] CredentialsError),

    #[error("project id missing from service account key and FIREBASE_PROJECT_ID")]
    ProjectIdMissing,

    #[error("failed to obtain access token: {0}")]
    AccessToken(String),
}

/// Project identity and OAuth2 bearer tokens for Google REST APIs.
#[async_trait]
pub trait ServiceCredentials: Send + Sync {
    async fn project_id(&self) -> Result<String, FirebaseError>;
    async fn access_token(&self) -> Result<String, FirebaseError>;
}

/// Initialized project context, created at most once per process.
pub struct FirebaseContext {
    project_id: String,
    authenticator: DefaultAuthenticator,
}

impl FirebaseContext {
    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

pub struct FirebaseApp {
    config: FirebaseConfig,
    context: OnceCell<FirebaseContext>,
}

impl FirebaseApp {
    pub fn configure(config: FirebaseConfig) -> Self {
        match CredentialSource::resolve(&config) {
            Some(source) => info!("Firebase credentials source: {}", source.kind()),
            None => warn!("Firebase credentials not configured; Firebase-backed routes will fail until they are"),
        }

        Self {
            config,
            context: OnceCell::new(),
        }
    }

    pub async fn ensure_ready(&self) -> Result<&FirebaseContext, FirebaseError> {
        self.context.get_or_try_init(|| self.initialize()).await
    }

    async fn initialize(&self) -> Result<FirebaseContext, FirebaseError> {
        let source = CredentialSource::resolve(&self.config).ok_or(FirebaseError::CredentialsMissing)?;
        let key = source.load().await?;

        let project_id = self
            .config
            .project_id
            .clone()
            .or_else(|| key.project_id.clone())
            .ok_or(FirebaseError::ProjectIdMissing)?;

        let authenticator = ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .map_err(|e| FirebaseError::AccessToken(e.to_string()))?;

        info!("Firebase initialized for project {}", project_id);
        Ok(FirebaseContext {
            project_id,
            authenticator,
        })
    }
}

#[async_trait]
impl ServiceCredentials for FirebaseApp {
    async fn project_id(&self) -> Result<String, FirebaseError> {
        Ok(self.ensure_ready().await?.project_id.clone())
    }

    async fn access_token(&self) -> Result<String, FirebaseError> {
        let context = self.ensure_ready().await?;
        let token = context
            .authenticator
            .token(SCOPES)
            .await
            .map_err(|e| FirebaseError::AccessToken(e.to_string()))?;

        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| FirebaseError::AccessToken("no token in response".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: GoogleErrorDetails,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetails {
    code: u16,
    message: String,
}

/// Readable message for a failed Google API call, falling back to the status line.
pub(crate) async fn error_message(response: reqwest::Response, default_msg: &str) -> String {
    let status = response.status();
    match response.json::<GoogleErrorResponse>().await {
        Ok(body) => format!("{}: {} (code: {})", default_msg, body.error.message, body.error.code),
        Err(_) => format!("{}: {}", default_msg, status),
    }
}

/// Fixed project and token, for emulators and tests.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    pub project_id: String,
    pub token: String,
}

#[async_trait]
impl ServiceCredentials for StaticCredentials {
    async fn project_id(&self) -> Result<String, FirebaseError> {
        Ok(self.project_id.clone())
    }

    async fn access_token(&self) -> Result<String, FirebaseError> {
        Ok(self.token.clone())
    }
}
