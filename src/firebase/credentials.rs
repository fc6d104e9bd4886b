use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use yup_oauth2::ServiceAccountKey;

use crate::config::FirebaseConfig;

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("failed to read credentials file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("credentials are not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("credentials are not valid UTF-8")]
    Utf8,

    #[error("credentials are not a valid service account key: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where the service account key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    File(PathBuf),
    Base64(String),
    Json(String),
}

impl CredentialSource {
    /// Pick the first usable source: file path, then base64, then raw JSON.
    ///
    /// A configured path that does not point at a file is skipped with a
    /// warning rather than treated as an error.
    pub fn resolve(config: &FirebaseConfig) -> Option<Self> {
        if let Some(path) = &config.credentials_path {
            if Path::new(path).is_file() {
                return Some(Self::File(PathBuf::from(path)));
            }
            warn!("FIREBASE_CREDENTIALS file not found: {}", path);
        }

        if let Some(b64) = &config.credentials_b64 {
            return Some(Self::Base64(b64.clone()));
        }

        config.credentials_json.clone().map(Self::Json)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Base64(_) => "base64",
            Self::Json(_) => "json",
        }
    }

    pub async fn load(&self) -> Result<ServiceAccountKey, CredentialsError> {
        let raw = match self {
            Self::File(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|source| CredentialsError::Io {
                    path: path.clone(),
                    source,
                })?,
            Self::Base64(encoded) => {
                let bytes = STANDARD.decode(encoded.trim())?;
                String::from_utf8(bytes).map_err(|_| CredentialsError::Utf8)?
            }
            Self::Json(json) => json.clone(),
        };

        Ok(serde_json::from_str(&raw)?)
    }
}
