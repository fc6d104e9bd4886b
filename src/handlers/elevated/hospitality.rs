// handlers/elevated/hospitality.rs - create/update/delete listings
use axum::extract::{multipart::{Multipart, MultipartRejection}, Path, State};

use super::form::read_listing_form;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{CreateListingInput, Listing, UpdateListingInput};
use crate::state::AppState;

fn invalid(field_errors: crate::error::FieldErrors) -> ApiError {
    ApiError::validation_error("Validation failed", Some(field_errors))
}

/// POST /hospitality/ - multipart form with optional `images` files
pub async fn create(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Listing> {
    let form = read_listing_form(multipart?).await?;
    let input = CreateListingInput::try_from(form).map_err(invalid)?;
    Ok(ApiResponse::created(state.hospitality.create(input).await?))
}

/// PATCH /hospitality/:id - partial multipart form, `replace_images=true` swaps the image list
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Listing> {
    let form = read_listing_form(multipart?).await?;
    let input = UpdateListingInput::try_from(form).map_err(invalid)?;
    Ok(ApiResponse::success(state.hospitality.update(&id, input).await?))
}

/// DELETE /hospitality/:id - removes the listing and its stored images
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.hospitality.delete(&id).await?;
    Ok(ApiResponse::no_content())
}
