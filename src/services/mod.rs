//! Business logic for each resource, written against the store traits.

pub mod booking_service;
pub mod chat_service;
pub mod hospitality_service;
pub mod user_service;

use thiserror::Error;

use crate::error::FieldErrors;
use crate::storage::StorageError;
use crate::store::StoreError;

pub use booking_service::BookingService;
pub use chat_service::ChatService;
pub use hospitality_service::HospitalityService;
pub use user_service::UserService;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
