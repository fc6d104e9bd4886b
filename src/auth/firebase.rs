use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::sync::Arc;

use super::keys::JwkCache;
use super::{AuthError, Caller, TokenVerifier};
use crate::firebase::ServiceCredentials;

/// Allowed clock skew for `auth_time`, in seconds.
const AUTH_TIME_SKEW: i64 = 300;

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    #[serde(default)]
    auth_time: Option<i64>,
    #[serde(default)]
    email: Option<String>,
}

/// Verifies Firebase Authentication ID tokens issued for the configured project.
pub struct FirebaseTokenVerifier {
    credentials: Arc<dyn ServiceCredentials>,
    keys: JwkCache,
}

impl FirebaseTokenVerifier {
    pub fn new(credentials: Arc<dyn ServiceCredentials>) -> Self {
        Self::with_keys(credentials, JwkCache::new())
    }

    pub fn with_keys(credentials: Arc<dyn ServiceCredentials>, keys: JwkCache) -> Self {
        Self { credentials, keys }
    }
}

#[async_trait]
impl TokenVerifier for FirebaseTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Caller, AuthError> {
        let project_id = self.credentials.project_id().await?;

        let header = decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::InvalidToken(format!("unexpected algorithm {:?}", header.alg)));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("missing kid in header".to_string()))?;

        let jwk = self.keys.get_key(&kid).await?;
        let key = DecodingKey::from_jwk(&jwk).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&project_id]);
        validation.set_issuer(&[format!("https://securetoken.google.com/{}", project_id)]);
        validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);

        let claims = decode::<IdTokenClaims>(token, &key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?
            .claims;

        if claims.sub.is_empty() {
            return Err(AuthError::InvalidToken("subject claim must not be empty".to_string()));
        }
        if let Some(auth_time) = claims.auth_time {
            if auth_time > Utc::now().timestamp() + AUTH_TIME_SKEW {
                return Err(AuthError::InvalidToken("auth_time is in the future".to_string()));
            }
        }

        Ok(Caller {
            uid: claims.sub,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firebase::{FirebaseApp, StaticCredentials};
    use httpmock::prelude::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};

    const PRIVATE_KEY: &str = include_str!("../../tests/fixtures/test_rsa_key.pem");
    const JWKS: &str = include_str!("../../tests/fixtures/test_jwks.json");

    fn sign(claims: Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some("test-key-1".to_string());
        let key = EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).unwrap();
        encode(&header, &claims, &key).unwrap()
    }

    fn claims(project: &str, sub: &str) -> Value {
        let now = Utc::now().timestamp();
        json!({
            "iss": format!("https://securetoken.google.com/{}", project),
            "aud": project,
            "sub": sub,
            "iat": now,
            "exp": now + 3600,
            "auth_time": now - 60,
            "email": "traveler@example.com",
        })
    }

    async fn verifier(server: &MockServer) -> FirebaseTokenVerifier {
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jwks");
                then.status(200).header("content-type", "application/json").body(JWKS);
            })
            .await;

        let credentials = Arc::new(StaticCredentials {
            project_id: "demo".to_string(),
            token: "unused".to_string(),
        });
        FirebaseTokenVerifier::with_keys(credentials, JwkCache::with_url(server.url("/jwks")))
    }

    #[tokio::test]
    async fn accepts_valid_token() {
        let server = MockServer::start_async().await;
        let caller = verifier(&server).await.verify(&sign(claims("demo", "uid-1"))).await.unwrap();

        assert_eq!(caller.uid, "uid-1");
        assert_eq!(caller.email.as_deref(), Some("traveler@example.com"));
    }

    #[tokio::test]
    async fn rejects_other_project() {
        let server = MockServer::start_async().await;
        let err = verifier(&server).await.verify(&sign(claims("other", "uid-1"))).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let server = MockServer::start_async().await;
        let mut c = claims("demo", "uid-1");
        c["exp"] = json!(Utc::now().timestamp() - 3600);

        let err = verifier(&server).await.verify(&sign(c)).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn rejects_empty_subject_and_future_auth_time() {
        let server = MockServer::start_async().await;
        let v = verifier(&server).await;

        let err = v.verify(&sign(claims("demo", ""))).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));

        let mut c = claims("demo", "uid-1");
        c["auth_time"] = json!(Utc::now().timestamp() + 3600);
        let err = v.verify(&sign(c)).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn rejects_garbage() {
        let server = MockServer::start_async().await;
        let err = verifier(&server).await.verify("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn missing_credentials_are_not_a_token_problem() {
        let app = Arc::new(FirebaseApp::configure(Default::default()));
        let err = FirebaseTokenVerifier::new(app).verify("anything").await.unwrap_err();
        assert!(matches!(err, AuthError::Firebase(_)));
    }
}
