use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::AuthContext;

use crate::models::{
    ChatMessageRequest, ChatReply, ChatbotError, ConversationExchange, FALLBACK_REPLY,
    HISTORY_WINDOW, TOP_K_SNIPPETS,
};
use crate::services::context::{build_messages, window};
use crate::services::knowledge::KnowledgeBase;
use crate::services::openai::OpenAiClient;
use crate::services::sentiment::classify;

pub struct AssistantService {
    supabase: SupabaseClient,
    openai: OpenAiClient,
    knowledge: Arc<KnowledgeBase>,
}

impl AssistantService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            openai: OpenAiClient::new(config),
            knowledge: KnowledgeBase::shared(&config.knowledge_base_path),
        }
    }

    async fn recent_exchanges(
        &self,
        user_id: Uuid,
        session_id: &str,
    ) -> Result<Vec<ConversationExchange>, ChatbotError> {
        let path = format!(
            "/rest/v1/chat_exchanges?user_id=eq.{}&session_id=eq.{}&order=created_at.desc&limit={}",
            user_id,
            urlencoding::encode(session_id),
            HISTORY_WINDOW
        );
        let rows: Vec<ConversationExchange> = self.supabase.select(&path).await?;
        Ok(window(rows))
    }

    /// Top corpus snippets for `message`. Embedding failures leave the
    /// reply without snippets.
    async fn snippets(&self, message: &str) -> Vec<String> {
        if self.knowledge.is_empty() {
            return Vec::new();
        }
        match self.openai.embed(message).await {
            Ok(embedding) => self
                .knowledge
                .top_k(&embedding, TOP_K_SNIPPETS)
                .into_iter()
                .map(|chunk| chunk.text.clone())
                .collect(),
            Err(e) => {
                warn!("Embedding failed, answering without knowledge snippets: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn reply(&self, ctx: &AuthContext, request: ChatMessageRequest) -> Result<ChatReply, ChatbotError> {
        let started = Instant::now();

        let message = request
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .ok_or(ChatbotError::EmptyMessage)?;
        let session_id = request
            .session_id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let history = self.recent_exchanges(ctx.user_id, &session_id).await?;
        debug!("Session {} has {} prior exchanges in context", session_id, history.len());

        let snippets = self.snippets(&message).await;
        let snippet_refs: Vec<&str> = snippets.iter().map(String::as_str).collect();
        let messages = build_messages(&snippet_refs, &history, &message);

        let (bot_reply, fallback) = match self.openai.complete(&messages).await {
            Ok(text) => (text, false),
            Err(e) => {
                warn!("Generation failed for session {}: {}", session_id, e);
                (FALLBACK_REPLY.to_string(), true)
            }
        };

        let sentiment = classify(&message);
        let _stored: ConversationExchange = self
            .supabase
            .insert(
                "chat_exchanges",
                json!({
                    "user_id": ctx.user_id,
                    "session_id": session_id,
                    "message": message,
                    "response": bot_reply,
                    "sentiment": sentiment,
                }),
            )
            .await?;
        info!("Stored exchange for user {} in session {}", ctx.user_id, session_id);

        Ok(ChatReply {
            user_message: message,
            bot_reply,
            sentiment,
            session_id,
            timestamp: Utc::now(),
            response_time: started.elapsed().as_millis() as u64,
            fallback,
        })
    }

    /// Every exchange of one of the caller's sessions, oldest first.
    pub async fn history(&self, ctx: &AuthContext, session_id: &str) -> Result<Vec<ConversationExchange>, ChatbotError> {
        let path = format!(
            "/rest/v1/chat_exchanges?user_id=eq.{}&session_id=eq.{}&order=created_at.asc",
            ctx.user_id,
            urlencoding::encode(session_id)
        );
        Ok(self.supabase.select(&path).await?)
    }

    /// Distinct session ids the caller has used, most recently active first.
    pub async fn sessions(&self, ctx: &AuthContext) -> Result<Vec<String>, ChatbotError> {
        let path = format!(
            "/rest/v1/chat_exchanges?user_id=eq.{}&select=session_id,created_at&order=created_at.desc",
            ctx.user_id
        );
        let rows: Vec<Value> = self.supabase.select(&path).await?;

        let mut seen = HashSet::new();
        let sessions = rows
            .iter()
            .filter_map(|row| row["session_id"].as_str())
            .filter(|session_id| seen.insert(*session_id))
            .map(str::to_string)
            .collect();
        Ok(sessions)
    }

    pub fn health(&self) -> Value {
        json!({
            "status": "healthy",
            "model": self.openai.chat_model(),
            "knowledge_chunks": self.knowledge.len(),
            "timestamp": Utc::now(),
        })
    }
}
