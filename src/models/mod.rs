//! Resource records as stored in the document store and returned over HTTP.

pub mod booking;
pub mod chat;
pub mod hospitality;
pub mod user;

pub use booking::{Booking, BookingCreate};
pub use chat::{ChatEntry, ChatRequest, ChatRole, ChatSession};
pub use hospitality::{
    CreateListingInput, HospitalityType, ImageRecord, ImageUpload, Listing, ListingForm, Location, UpdateListingInput,
};
pub use user::{UserProfile, UserType};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Accepts RFC 3339 timestamps, and naive `YYYY-MM-DDTHH:MM:SS[.f]` ones read as UTC.
pub(crate) fn deserialize_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_datetime(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid datetime '{}'", raw)))
}

pub(crate) fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}
