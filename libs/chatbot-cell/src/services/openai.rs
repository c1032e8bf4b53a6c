use anyhow::{anyhow, Result};
use reqwest::{header, Client};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;

use crate::models::{ChatMessage, CHAT_MAX_TOKENS, CHAT_TEMPERATURE};

/// Thin client over an OpenAI-compatible embeddings and chat-completions API.
pub struct OpenAiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    chat_model: String,
    embedding_model: String,
}

impl OpenAiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http_client: Client::new(),
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            chat_model: config.openai_chat_model.clone(),
            embedding_model: config.openai_embedding_model.clone(),
        }
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    async fn post(&self, endpoint: &str, body: Value) -> Result<Value> {
        if self.api_key.is_empty() {
            return Err(anyhow!("OPENAI_API_KEY is not configured"));
        }

        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("Calling {}", url);

        let response = self
            .http_client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("OpenAI API error ({}): {}", status, error_text));
        }

        Ok(response.json().await?)
    }

    pub async fn embed(&self, input: &str) -> Result<Vec<f32>> {
        let body = self
            .post(
                "embeddings",
                json!({
                    "model": self.embedding_model,
                    "input": input
                }),
            )
            .await?;

        let values = body["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| anyhow!("Invalid embedding response format"))?;

        values
            .iter()
            .map(|v| {
                v.as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| anyhow!("Non-numeric embedding component"))
            })
            .collect()
    }

    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = self
            .post(
                "chat/completions",
                json!({
                    "model": self.chat_model,
                    "messages": messages,
                    "temperature": CHAT_TEMPERATURE,
                    "max_tokens": CHAT_MAX_TOKENS
                }),
            )
            .await?;

        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow!("Invalid OpenAI response format"))?
            .trim()
            .to_string();

        if content.is_empty() {
            return Err(anyhow!("OpenAI returned an empty reply"));
        }
        Ok(content)
    }
}
