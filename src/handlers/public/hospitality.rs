// handlers/public/hospitality.rs - read-only listing endpoints
use axum::extract::{Path, State};

use crate::middleware::{ApiResponse, ApiResult};
use crate::models::Listing;
use crate::state::AppState;

/// GET /hospitality/ - all listings, newest first
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Listing>> {
    Ok(ApiResponse::success(state.hospitality.list().await?))
}

/// GET /hospitality/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Listing> {
    Ok(ApiResponse::success(state.hospitality.get(&id).await?))
}
