use crate::models::{ChatMessage, ChatRole, ConversationExchange, HISTORY_WINDOW};

const PERSONA: &str = "You are Serenio AI, a supportive and non-judgmental mental health assistant.

IMPORTANT: You have access to the conversation history above. Use this context to provide personalized, continuous support. Remember what the user has shared previously and build upon that conversation.";

const GUIDELINES: &str = "Guidelines:
- Be empathetic and supportive
- Remember previous conversation context
- Provide practical advice when appropriate
- Maintain conversation continuity
- Ask follow-up questions when helpful
- Keep responses concise but meaningful";

pub fn system_prompt(snippets: &[&str]) -> String {
    format!(
        "{}\n\nUse the following knowledge base context if relevant to the user's current message:\n{}\n\n{}",
        PERSONA,
        snippets.join("\n\n"),
        GUIDELINES
    )
}

/// Keeps at most the last `HISTORY_WINDOW` exchanges, oldest first.
pub fn window(mut history: Vec<ConversationExchange>) -> Vec<ConversationExchange> {
    history.sort_by_key(|exchange| exchange.created_at);
    let skip = history.len().saturating_sub(HISTORY_WINDOW);
    history.split_off(skip)
}

/// System instructions, then each prior turn as user/assistant pairs,
/// then the new message.
pub fn build_messages(
    snippets: &[&str],
    history: &[ConversationExchange],
    message: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() * 2 + 2);
    messages.push(ChatMessage::new(ChatRole::System, system_prompt(snippets)));

    for exchange in history {
        messages.push(ChatMessage::new(ChatRole::User, exchange.message.clone()));
        messages.push(ChatMessage::new(ChatRole::Assistant, exchange.response.clone()));
    }

    messages.push(ChatMessage::new(ChatRole::User, message));
    messages
}
