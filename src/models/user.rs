use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Document, Fields};

pub const COLLECTION: &str = "users";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub created_on: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Anything other than an explicit `admin` type reads as a regular user.
    pub fn from_document(doc: &Document) -> Self {
        let user_type = match doc.get("type").and_then(|v| v.as_str()) {
            Some("admin") => UserType::Admin,
            _ => UserType::User,
        };

        Self {
            id: doc.id.clone(),
            email: doc.get("email").and_then(|v| v.as_str()).map(str::to_string),
            user_type,
            created_on: doc.optional_timestamp("createdOn"),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.user_type == UserType::Admin
    }

    pub fn new_user_fields(email: Option<&str>, created_on: DateTime<Utc>) -> Fields {
        let mut fields = Fields::new();
        fields.insert("email".to_string(), email.into());
        fields.insert("type".to_string(), "user".into());
        fields.insert("createdOn".to_string(), created_on.into());
        fields
    }
}
