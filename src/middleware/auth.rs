use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
    Extension,
};

use crate::auth::{bearer_token, Caller};
use crate::error::ApiError;
use crate::state::AppState;

/// Bearer authentication middleware that verifies the token and injects the [`Caller`]
pub async fn require_caller(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&headers)?;
    let caller = state.verifier.verify(token).await?;

    tracing::debug!("authenticated caller {}", caller.uid);
    request.extensions_mut().insert(caller);

    Ok(next.run(request).await)
}

/// Admin gate layered inside [`require_caller`]; the profile is created on first sight.
pub async fn require_admin(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let profile = state
        .users
        .get_or_create(&caller.uid, caller.email.as_deref())
        .await?;

    if !profile.is_admin() {
        tracing::info!("denied non-admin {} on {}", caller.uid, request.uri().path());
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    Ok(next.run(request).await)
}
