use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FieldErrors;
use crate::store::{Document, Fields, StoreError};

pub const COLLECTION: &str = "bookings";

pub const MIN_TICKETS: i64 = 1;
pub const MAX_TICKETS: i64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    #[serde(rename = "hospitalityID")]
    pub hospitality_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub user: String,
    pub ticket_count: i64,
    pub created_on: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        Ok(Self {
            id: doc.id.clone(),
            hospitality_id: doc.require_str("hospitalityID")?,
            start_date: doc.require_timestamp("startDate")?,
            end_date: doc.require_timestamp("endDate")?,
            user: doc.require_str("user")?,
            ticket_count: doc
                .get("ticketCount")
                .and_then(|v| v.as_i64())
                .ok_or_else(|| doc.malformed("ticketCount"))?,
            created_on: doc.optional_timestamp("createdOn"),
        })
    }
}

/// Booking request body. A `user` field, if sent, is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingCreate {
    #[serde(rename = "hospitalityID")]
    pub hospitality_id: String,
    #[serde(deserialize_with = "super::deserialize_datetime")]
    pub start_date: DateTime<Utc>,
    #[serde(deserialize_with = "super::deserialize_datetime")]
    pub end_date: DateTime<Utc>,
    #[serde(default = "default_ticket_count")]
    pub ticket_count: i64,
}

fn default_ticket_count() -> i64 {
    MIN_TICKETS
}

impl BookingCreate {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.hospitality_id.trim().is_empty() {
            errors.insert("hospitalityID".to_string(), "must not be empty".to_string());
        }
        if self.end_date <= self.start_date {
            errors.insert("endDate".to_string(), "endDate must be after startDate".to_string());
        }
        if !(MIN_TICKETS..=MAX_TICKETS).contains(&self.ticket_count) {
            errors.insert(
                "ticketCount".to_string(),
                format!("must be between {} and {}", MIN_TICKETS, MAX_TICKETS),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Stored fields for a booking owned by `user`.
    pub fn into_fields(self, user: &str, created_on: DateTime<Utc>) -> Fields {
        let mut fields = Fields::new();
        fields.insert("hospitalityID".to_string(), self.hospitality_id.into());
        fields.insert("startDate".to_string(), self.start_date.into());
        fields.insert("endDate".to_string(), self.end_date.into());
        fields.insert("user".to_string(), user.into());
        fields.insert("ticketCount".to_string(), self.ticket_count.into());
        fields.insert("createdOn".to_string(), created_on.into());
        fields
    }
}
