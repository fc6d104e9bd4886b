use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use super::ServiceError;
use crate::auth::Caller;
use crate::models::booking::{Booking, BookingCreate, COLLECTION};
use crate::store::{DocumentStore, FieldValue};

#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn DocumentStore>,
}

impl BookingService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a booking owned by the caller. The referenced listing is not
    /// checked for existence.
    pub async fn create(&self, request: BookingCreate, caller: &Caller) -> Result<Booking, ServiceError> {
        request.validate().map_err(ServiceError::Validation)?;

        let id = self.store.new_id();
        let doc = self
            .store
            .create(COLLECTION, &id, request.into_fields(&caller.uid, Utc::now()))
            .await?;

        info!("booking {} created by {}", id, caller.uid);
        Ok(Booking::from_document(&doc)?)
    }

    /// The caller's bookings, newest first.
    pub async fn list(&self, caller: &Caller) -> Result<Vec<Booking>, ServiceError> {
        let docs = self
            .store
            .find_eq(COLLECTION, "user", FieldValue::from(caller.uid.as_str()))
            .await?;

        let mut bookings = docs
            .iter()
            .map(Booking::from_document)
            .collect::<Result<Vec<_>, _>>()?;
        bookings.sort_by(|a, b| b.created_on.cmp(&a.created_on));
        Ok(bookings)
    }

    pub async fn get(&self, id: &str, caller: &Caller) -> Result<Booking, ServiceError> {
        let doc = self
            .store
            .get(COLLECTION, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Booking not found".to_string()))?;

        let booking = Booking::from_document(&doc)?;
        if booking.user != caller.uid {
            return Err(ServiceError::Forbidden("Booking belongs to another user".to_string()));
        }
        Ok(booking)
    }

    pub async fn delete(&self, id: &str, caller: &Caller) -> Result<(), ServiceError> {
        self.get(id, caller).await?;
        self.store.delete(COLLECTION, id).await?;
        info!("booking {} deleted by {}", id, caller.uid);
        Ok(())
    }
}
