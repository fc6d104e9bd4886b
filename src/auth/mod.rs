//! Bearer-token authentication.
//!
//! A [`TokenVerifier`] turns the token from an `Authorization: Bearer` header
//! into a [`Caller`]. Production uses [`FirebaseTokenVerifier`]; local
//! development can swap in [`DummyUserVerifier`].

pub mod firebase;
pub mod keys;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use std::collections::HashMap;
use thiserror::Error;

use crate::firebase::FirebaseError;

pub use firebase::FirebaseTokenVerifier;
pub use keys::{JwkCache, KeyFetchError};

/// Authenticated subject of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Caller {
    pub uid: String,
    pub email: Option<String>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Unauthenticated(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error(transparent)]
    Keys(#[from] KeyFetchError),

    #[error(transparent)]
    Firebase(#[from] FirebaseError),
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Caller, AuthError>;
}

/// Extract the bearer token from request headers.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AuthError::Unauthenticated("Missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| AuthError::Unauthenticated("Invalid Authorization header format".to_string()))?;

    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::Unauthenticated(
            "Authorization header must use Bearer token format".to_string(),
        ));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::Unauthenticated("Empty bearer token".to_string()));
    }

    Ok(token)
}

/// Accepts any bearer token as a fixed development user.
pub struct DummyUserVerifier {
    caller: Caller,
}

impl DummyUserVerifier {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            caller: Caller {
                uid: uid.into(),
                email: Some(email.into()),
            },
        }
    }
}

#[async_trait]
impl TokenVerifier for DummyUserVerifier {
    async fn verify(&self, _token: &str) -> Result<Caller, AuthError> {
        Ok(self.caller.clone())
    }
}

/// Fixed token table, for tests.
#[derive(Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, Caller>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: &str, uid: &str, email: Option<&str>) -> Self {
        self.tokens.insert(
            token.to_string(),
            Caller {
                uid: uid.to_string(),
                email: email.map(str::to_string),
            },
        );
        self
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Caller, AuthError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| AuthError::InvalidToken("unknown token".to_string()))
    }
}
