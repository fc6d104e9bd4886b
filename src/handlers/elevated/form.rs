// handlers/elevated/form.rs - multipart listing forms
use axum::extract::multipart::Multipart;

use crate::error::ApiError;
use crate::models::{ImageUpload, ListingForm};

/// Field name carrying image files; may repeat.
const IMAGES_FIELD: &str = "images";

/// Read every part of a listing form once. Text parts go to their named
/// slot and `images` file parts are collected. A text part named `images`
/// is not a file and is dropped with the other unknown text fields.
pub async fn read_listing_form(mut multipart: Multipart) -> Result<ListingForm, ApiError> {
    let mut form = ListingForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == IMAGES_FIELD && field.file_name().is_some() {
            let filename = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await?;
            form.add_image(ImageUpload {
                filename,
                content_type,
                data,
            });
        } else if field.file_name().is_none() {
            form.set_text(&name, field.text().await?);
        } else {
            tracing::debug!("ignoring unexpected file part '{}'", name);
        }
    }

    Ok(form)
}
