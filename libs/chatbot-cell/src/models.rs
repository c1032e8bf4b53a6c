use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::supabase::DatabaseError;
use shared_models::error::AppError;
use shared_models::sentiment::Sentiment;

/// Prior exchanges replayed to the model.
pub const HISTORY_WINDOW: usize = 10;
/// Knowledge snippets embedded in the system prompt.
pub const TOP_K_SNIPPETS: usize = 3;
pub const CHAT_TEMPERATURE: f32 = 0.7;
pub const CHAT_MAX_TOKENS: u32 = 300;
pub const FALLBACK_REPLY: &str = "Sorry, I couldn’t respond at the moment. Please try again.";

/// One entry of the precomputed knowledge corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    pub text: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationExchange {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: String,
    pub message: String,
    #[serde(default)]
    pub response: String,
    pub sentiment: Sentiment,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatMessageRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "sessionId")]
    pub session_id: Option<String>,
}

/// Reply shape the mobile and web clients already consume.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub user_message: String,
    pub bot_reply: String,
    pub sentiment: Sentiment,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub response_time: u64,
    pub fallback: bool,
}

#[derive(Error, Debug)]
pub enum ChatbotError {
    #[error("No message provided")]
    EmptyMessage,

    #[error("Knowledge corpus unavailable: {0}")]
    Corpus(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<ChatbotError> for AppError {
    fn from(err: ChatbotError) -> Self {
        match err {
            ChatbotError::EmptyMessage => AppError::BadRequest(err.to_string()),
            ChatbotError::Corpus(_) => AppError::Internal(err.to_string()),
            ChatbotError::Database(db) => db.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reply_uses_client_field_names() {
        let reply = ChatReply {
            user_message: "hi".to_string(),
            bot_reply: "hello".to_string(),
            sentiment: Sentiment::Neutral,
            session_id: "s-1".to_string(),
            timestamp: Utc::now(),
            response_time: 12,
            fallback: false,
        };
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["userMessage"], "hi");
        assert_eq!(value["botReply"], "hello");
        assert_eq!(value["sessionId"], "s-1");
        assert_eq!(value["responseTime"], 12);
    }

    #[test]
    fn request_accepts_camel_case_session() {
        let req: ChatMessageRequest =
            serde_json::from_value(json!({ "message": "hey", "sessionId": "abc" })).unwrap();
        assert_eq!(req.session_id.as_deref(), Some("abc"));
    }

    #[test]
    fn roles_serialize_lowercase() {
        let msg = ChatMessage::new(ChatRole::Assistant, "ok");
        assert_eq!(serde_json::to_value(&msg).unwrap()["role"], "assistant");
    }
}
