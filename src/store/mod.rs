//! Document store abstraction.
//!
//! Records are maps of typed [`FieldValue`]s keyed by a generated id inside a
//! named collection, mirroring the Firestore data model. Single-document
//! writes are atomic; nothing here spans documents.

pub mod firestore;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::firebase::FirebaseError;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

pub type Fields = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<FieldValue>),
    Map(Fields),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers are accepted too, since a whole-number coordinate may be stored either way.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Double(d) => Some(*d),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            FieldValue::String(s) => DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc)),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Array(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Fields> {
        match self {
            FieldValue::Map(fields) => Some(fields),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Double(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// A stored record: its id and its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn require_str(&self, field: &str) -> Result<String, StoreError> {
        self.get(field)
            .and_then(FieldValue::as_str)
            .map(str::to_string)
            .ok_or_else(|| self.malformed(field))
    }

    pub fn require_timestamp(&self, field: &str) -> Result<DateTime<Utc>, StoreError> {
        self.get(field)
            .and_then(FieldValue::as_timestamp)
            .ok_or_else(|| self.malformed(field))
    }

    pub fn optional_timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        self.get(field).and_then(FieldValue::as_timestamp)
    }

    pub fn malformed(&self, field: &str) -> StoreError {
        StoreError::Malformed(format!("document {} has missing or invalid field '{}'", self.id, field))
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Firebase(#[from] FirebaseError),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("invalid document id '{0}'")]
    InvalidId(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Allocate a fresh document id without writing anything.
    fn new_id(&self) -> String;

    async fn create(&self, collection: &str, id: &str, fields: Fields) -> Result<Document, StoreError>;

    /// Ids rejected by [`is_valid_id`] read as absent.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    async fn find_eq(&self, collection: &str, field: &str, value: FieldValue) -> Result<Vec<Document>, StoreError>;

    /// Merge the given top-level fields into an existing document and return the result.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<Document, StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}

/// Longest document id Firestore accepts, in bytes.
const MAX_ID_BYTES: usize = 1500;

/// Whether `id` names a single document directly inside a collection.
///
/// Ids come from request paths already percent-decoded, so a `/` or a dot
/// segment would address a document in another collection.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_BYTES
        && !id.contains('/')
        && !matches!(id, "." | "..")
        && !(id.len() >= 4 && id.starts_with("__") && id.ends_with("__"))
}

/// Document ids are 20 alphanumeric characters, like Firestore's auto ids.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..20].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_converts_to_null() {
        let none: Option<String> = None;
        assert_eq!(FieldValue::from(none), FieldValue::Null);
        assert_eq!(FieldValue::from(Some("a")), FieldValue::String("a".into()));
    }

    #[test]
    fn timestamps_read_from_strings_too() {
        let v = FieldValue::String("2025-09-18T10:00:00Z".into());
        assert_eq!(v.as_timestamp().unwrap().to_rfc3339(), "2025-09-18T10:00:00+00:00");
    }

    #[test]
    fn ids_that_leave_the_collection_are_invalid() {
        for id in ["", ".", "..", "../users/victim", "a/b", "__name__"] {
            assert!(!is_valid_id(id), "{:?}", id);
        }
        for id in ["b1", "%2e%2e", "...", "_x_", generate_id().as_str()] {
            assert!(is_valid_id(id), "{:?}", id);
        }
    }

    #[test]
    fn generated_ids_are_distinct() {
        let a = generate_id();
        let b = generate_id();
        assert_eq!(a.len(), 20);
        assert_ne!(a, b);
    }

    #[test]
    fn require_reports_field() {
        let doc = Document {
            id: "d1".into(),
            fields: Fields::new(),
        };
        let err = doc.require_str("name").unwrap_err();
        assert!(err.to_string().contains("'name'"));
    }
}
