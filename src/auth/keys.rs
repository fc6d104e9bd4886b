use jsonwebtoken::jwk::{Jwk, JwkSet};
use reqwest::{header, Client};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

/// Google's signing keys for Firebase ID tokens, in JWK form.
pub const SECURETOKEN_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const DEFAULT_MAX_AGE: u64 = 3600;

/// Fresh keys are not refetched for an unknown kid until they are this old.
const DEFAULT_MIN_REFRESH: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum KeyFetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Key fetch failed with status {0}")]
    Status(u16),

    #[error("No signing key with kid '{0}'")]
    UnknownKid(String),
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
    expires_at: Instant,
}

/// Fetches and caches public keys for as long as the `Cache-Control: max-age`
/// of the key endpoint allows.
///
/// A kid missing from a fresh set forces a refetch at most once per
/// `min_refresh`, so tokens with made-up kids cannot hammer the endpoint.
pub struct JwkCache {
    client: Client,
    url: String,
    min_refresh: Duration,
    cache: RwLock<Option<CachedKeys>>,
}

impl JwkCache {
    pub fn new() -> Self {
        Self::with_url(SECURETOKEN_JWKS_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            min_refresh: DEFAULT_MIN_REFRESH,
            cache: RwLock::new(None),
        }
    }

    pub fn with_min_refresh(mut self, min_refresh: Duration) -> Self {
        self.min_refresh = min_refresh;
        self
    }

    pub async fn get_key(&self, kid: &str) -> Result<Jwk, KeyFetchError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = &*cache {
                if Instant::now() < cached.expires_at {
                    if let Some(key) = cached.keys.find(kid) {
                        return Ok(key.clone());
                    }
                    if cached.fetched_at.elapsed() < self.min_refresh {
                        debug!("kid '{}' not in keys fetched {:?} ago", kid, cached.fetched_at.elapsed());
                        return Err(KeyFetchError::UnknownKid(kid.to_string()));
                    }
                }
            }
        }

        // Unknown kid or stale cache; keys may have rotated.
        self.refresh().await?;

        let cache = self.cache.read().await;
        cache
            .as_ref()
            .and_then(|c| c.keys.find(kid))
            .cloned()
            .ok_or_else(|| KeyFetchError::UnknownKid(kid.to_string()))
    }

    async fn refresh(&self) -> Result<(), KeyFetchError> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(KeyFetchError::Status(response.status().as_u16()));
        }

        let max_age = response
            .headers()
            .get(header::CACHE_CONTROL)
            .and_then(|h| h.to_str().ok())
            .and_then(parse_max_age)
            .unwrap_or(DEFAULT_MAX_AGE);

        let keys: JwkSet = response.json().await?;
        debug!("fetched {} signing keys, cached for {}s", keys.keys.len(), max_age);

        let now = Instant::now();
        *self.cache.write().await = Some(CachedKeys {
            keys,
            fetched_at: now,
            expires_at: now + Duration::from_secs(max_age),
        });

        Ok(())
    }
}

impl Default for JwkCache {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_max_age(cache_control: &str) -> Option<u64> {
    cache_control
        .split(',')
        .find_map(|part| part.trim().strip_prefix("max-age=")?.parse().ok())
}
