use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use super::ServiceError;
use crate::error::FieldErrors;
use crate::llm::LanguageModel;
use crate::models::chat::{history_field, history_from_document, ChatEntry, ChatRole, ChatSession, COLLECTION};
use crate::store::{DocumentStore, Fields};

pub const FALLBACK_SYSTEM_PROMPT: &str =
    "You are a helpful tourism assistant. Provide concise, factual answers.";

/// Read the system prompt from `path`, falling back to the built-in prompt
/// when the file is missing, unreadable or blank.
pub async fn load_system_prompt(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    match tokio::fs::read_to_string(path).await {
        Ok(content) if !content.trim().is_empty() => content.trim().to_string(),
        Ok(_) => {
            warn!("system prompt {} is empty, using built-in prompt", path.display());
            FALLBACK_SYSTEM_PROMPT.to_string()
        }
        Err(e) => {
            warn!("could not read system prompt {}: {}; using built-in prompt", path.display(), e);
            FALLBACK_SYSTEM_PROMPT.to_string()
        }
    }
}

/// Single prompt made of the session's system entry (or the default prompt),
/// a blank line, the transcript and a trailing `Assistant:` cue.
pub fn build_prompt(system_prompt: &str, history: &[ChatEntry]) -> String {
    let system = history
        .iter()
        .find(|e| e.role == ChatRole::System && !e.message.is_empty())
        .map(|e| e.message.as_str())
        .unwrap_or(system_prompt);

    let mut prompt = format!("{}\n\n", system);
    for entry in history {
        match entry.role {
            ChatRole::System => {}
            ChatRole::User => prompt.push_str(&format!("User: {}\n", entry.message)),
            ChatRole::Assistant => prompt.push_str(&format!("Assistant: {}\n", entry.message)),
        }
    }
    prompt.push_str("Assistant:");
    prompt
}

#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn DocumentStore>,
    model: Arc<dyn LanguageModel>,
    system_prompt: Arc<str>,
}

impl ChatService {
    pub fn new(store: Arc<dyn DocumentStore>, model: Arc<dyn LanguageModel>, system_prompt: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            model,
            system_prompt: system_prompt.into(),
        }
    }

    fn validate(message: &str) -> Result<(), ServiceError> {
        if message.is_empty() {
            let mut errors = FieldErrors::new();
            errors.insert("message".to_string(), "must not be empty".to_string());
            return Err(ServiceError::Validation(errors));
        }
        Ok(())
    }

    /// Model failures become the reply text instead of failing the request.
    async fn reply(&self, history: &[ChatEntry]) -> ChatEntry {
        let prompt = build_prompt(&self.system_prompt, history);
        let message = match self.model.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("chat reply generation failed: {}", e);
                format!("(error generating reply: {})", e)
            }
        };
        ChatEntry::new(ChatRole::Assistant, message)
    }

    pub async fn start(&self, message: String) -> Result<ChatSession, ServiceError> {
        Self::validate(&message)?;

        let id = uuid::Uuid::new_v4().to_string();
        let mut history = vec![
            ChatEntry::new(ChatRole::System, &*self.system_prompt),
            ChatEntry::new(ChatRole::User, message),
        ];
        history.push(self.reply(&history).await);

        let now = Utc::now();
        let mut fields = Fields::new();
        fields.insert("createdAt".to_string(), now.into());
        fields.insert("updatedAt".to_string(), now.into());
        fields.insert("history".to_string(), history_field(&history));
        self.store.create(COLLECTION, &id, fields).await?;

        info!("chat session {} started", id);
        Ok(ChatSession::public(id, history))
    }

    pub async fn send(&self, session_id: &str, message: String) -> Result<ChatSession, ServiceError> {
        Self::validate(&message)?;

        let doc = self
            .store
            .get(COLLECTION, session_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Session not found".to_string()))?;
        let mut history = history_from_document(&doc)?;

        history.push(ChatEntry::new(ChatRole::User, message));
        history.push(self.reply(&history).await);

        let mut fields = Fields::new();
        fields.insert("history".to_string(), history_field(&history));
        fields.insert("updatedAt".to_string(), Utc::now().into());
        self.store.update(COLLECTION, session_id, fields).await?;

        Ok(ChatSession::public(session_id.to_string(), history))
    }
}
