use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::config::AppConfig;
use crate::images::ImageStore;
use crate::llm::LanguageModel;
use crate::services::{BookingService, ChatService, HospitalityService, UserService};
use crate::storage::BlobStore;
use crate::store::DocumentStore;

/// Shared handles for every request. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub users: UserService,
    pub bookings: BookingService,
    pub hospitality: HospitalityService,
    pub chat: ChatService,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        verifier: Arc<dyn TokenVerifier>,
        model: Arc<dyn LanguageModel>,
        system_prompt: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            verifier,
            users: UserService::new(documents.clone()),
            bookings: BookingService::new(documents.clone()),
            hospitality: HospitalityService::new(documents.clone(), ImageStore::new(blobs)),
            chat: ChatService::new(documents, model, system_prompt),
        }
    }
}
