use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use super::ServiceError;
use crate::models::user::{UserProfile, COLLECTION};
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn DocumentStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Profile stored under the caller's uid, created as a regular user on first sight.
    pub async fn get_or_create(&self, uid: &str, email: Option<&str>) -> Result<UserProfile, ServiceError> {
        if let Some(doc) = self.store.get(COLLECTION, uid).await? {
            return Ok(UserProfile::from_document(&doc));
        }

        let doc = self
            .store
            .create(COLLECTION, uid, UserProfile::new_user_fields(email, Utc::now()))
            .await?;
        info!("created user profile {}", uid);
        Ok(UserProfile::from_document(&doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserType;
    use crate::store::{FieldValue, Fields, MemoryStore};

    #[tokio::test]
    async fn creates_regular_user_once() {
        let store = Arc::new(MemoryStore::new());
        let users = UserService::new(store.clone());

        let first = users.get_or_create("u1", Some("a@example.com")).await.unwrap();
        assert_eq!(first.user_type, UserType::User);
        assert_eq!(first.email.as_deref(), Some("a@example.com"));

        let again = users.get_or_create("u1", Some("changed@example.com")).await.unwrap();
        assert_eq!(again.email.as_deref(), Some("a@example.com"));
        assert_eq!(store.count(COLLECTION).await, 1);
    }

    #[tokio::test]
    async fn reads_existing_admin() {
        let store = Arc::new(MemoryStore::new());
        let mut fields = Fields::new();
        fields.insert("type".to_string(), FieldValue::from("admin"));
        store.create(COLLECTION, "boss", fields).await.unwrap();

        let profile = UserService::new(store).get_or_create("boss", None).await.unwrap();
        assert!(profile.is_admin());
    }
}
