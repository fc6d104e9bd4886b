use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Document, FieldValue, Fields, StoreError};

pub const COLLECTION: &str = "chatbot_sessions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "system" => Some(ChatRole::System),
            "user" => Some(ChatRole::User),
            "assistant" => Some(ChatRole::Assistant),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    #[serde(rename = "type")]
    pub role: ChatRole,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatEntry {
    pub fn new(role: ChatRole, message: impl Into<String>) -> Self {
        Self {
            role,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    fn to_field_value(&self) -> FieldValue {
        let mut map = Fields::new();
        map.insert("type".to_string(), self.role.as_str().into());
        map.insert("message".to_string(), self.message.as_str().into());
        map.insert("timestamp".to_string(), self.timestamp.into());
        FieldValue::Map(map)
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        let map = value.as_map()?;
        Some(Self {
            role: ChatRole::parse(map.get("type")?.as_str()?)?,
            message: map.get("message")?.as_str()?.to_string(),
            timestamp: map.get("timestamp")?.as_timestamp()?,
        })
    }
}

pub fn history_field(history: &[ChatEntry]) -> FieldValue {
    FieldValue::Array(history.iter().map(ChatEntry::to_field_value).collect())
}

pub fn history_from_document(doc: &Document) -> Result<Vec<ChatEntry>, StoreError> {
    match doc.get("history") {
        None => Ok(Vec::new()),
        Some(value) => value
            .as_array()
            .ok_or_else(|| doc.malformed("history"))?
            .iter()
            .map(|entry| ChatEntry::from_field_value(entry).ok_or_else(|| doc.malformed("history")))
            .collect(),
    }
}

/// Session as returned to clients: the system prompt is never included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub history: Vec<ChatEntry>,
}

impl ChatSession {
    pub fn public(id: String, history: Vec<ChatEntry>) -> Self {
        Self {
            id,
            history: history.into_iter().filter(|e| e.role != ChatRole::System).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_session_hides_system_entry() {
        let history = vec![
            ChatEntry::new(ChatRole::System, "be helpful"),
            ChatEntry::new(ChatRole::User, "hi"),
            ChatEntry::new(ChatRole::Assistant, "hello"),
        ];
        let session = ChatSession::public("s1".to_string(), history);
        let roles: Vec<_> = session.history.iter().map(|e| e.role).collect();
        assert_eq!(roles, vec![ChatRole::User, ChatRole::Assistant]);
    }

    #[test]
    fn history_survives_storage() {
        let history = vec![ChatEntry::new(ChatRole::User, "hi")];
        let mut fields = Fields::new();
        fields.insert("history".to_string(), history_field(&history));
        let doc = Document {
            id: "s1".to_string(),
            fields,
        };

        assert_eq!(history_from_document(&doc).unwrap(), history);
    }
}
