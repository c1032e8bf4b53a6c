pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{ChatReply, ChatbotError, ConversationExchange, KnowledgeChunk};
pub use services::knowledge::{cosine_similarity, KnowledgeBase};
