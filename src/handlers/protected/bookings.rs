// handlers/protected/bookings.rs - bookings owned by the caller
use axum::extract::{rejection::JsonRejection, Path, State};
use axum::{Extension, Json};

use crate::auth::Caller;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{Booking, BookingCreate};
use crate::state::AppState;

/// POST /bookings/
pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<BookingCreate>, JsonRejection>,
) -> ApiResult<Booking> {
    let Json(request) = payload?;
    Ok(ApiResponse::created(state.bookings.create(request, &caller).await?))
}

/// GET /bookings/ - the caller's bookings, newest first
pub async fn list(State(state): State<AppState>, Extension(caller): Extension<Caller>) -> ApiResult<Vec<Booking>> {
    Ok(ApiResponse::success(state.bookings.list(&caller).await?))
}

/// GET /bookings/:id - 404 when missing, 403 when owned by someone else
pub async fn get(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Booking> {
    Ok(ApiResponse::success(state.bookings.get(&id, &caller).await?))
}

/// DELETE /bookings/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.bookings.delete(&id, &caller).await?;
    Ok(ApiResponse::no_content())
}
