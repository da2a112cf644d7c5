//! OpenAI-compatible chat-completions generator.
//!
//! Works with OpenAI's API and any compatible endpoint.

use crate::parse::{extract_label, parse_generated};
use async_trait::async_trait;
use murmur_core::{
    config::ProviderConfig,
    error::MurmurError,
    traits::{GeneratedContent, Generator},
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

/// Generator backed by `POST {base_url}/chat/completions`.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    /// Model for should-respond classification.
    model: String,
    /// Model for reply generation.
    model_large: String,
    /// Persona system prompt sent with every call.
    system: String,
}

impl OpenAiGenerator {
    /// Create from config values and the persona's system prompt.
    pub fn from_config(config: &ProviderConfig, system: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            model_large: config.model_large.clone(),
            system: system.into(),
        }
    }

    async fn complete(&self, model: &str, prompt: &str) -> Result<String, MurmurError> {
        let start = Instant::now();
        let body = ChatCompletionRequest {
            model: model.to_string(),
            messages: build_messages(&self.system, prompt),
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!("openai: POST {url} model={model}");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MurmurError::Provider(format!("openai request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(MurmurError::Provider(format!(
                "openai returned {status}: {text}"
            )));
        }

        let parsed: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| MurmurError::Provider(format!("openai: failed to parse response: {e}")))?;

        let tokens = parsed.usage.as_ref().and_then(|u| u.total_tokens);
        debug!(
            "openai: {model} answered in {}ms ({} tokens)",
            start.elapsed().as_millis(),
            tokens.map(|t| t.to_string()).unwrap_or_else(|| "?".into())
        );

        Ok(first_choice_text(&parsed).unwrap_or_default())
    }
}

/// System message (when set) followed by the rendered prompt as the user turn.
pub(crate) fn build_messages(system: &str, prompt: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if !system.is_empty() {
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: system.to_string(),
        });
    }
    messages.push(ChatMessage {
        role: "user".to_string(),
        content: prompt.to_string(),
    });
    messages
}

fn first_choice_text(resp: &ChatCompletionResponse) -> Option<String> {
    resp.choices
        .as_ref()
        .and_then(|c| c.first())
        .and_then(|c| c.message.as_ref())
        .and_then(|m| m.content.clone())
}

#[derive(Serialize, Deserialize, Clone)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Option<Vec<ChatChoice>>,
    pub usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
pub(crate) struct ChatChoice {
    pub message: Option<ResponseMessage>,
}

/// Assistant message; `content` is null for refusals and tool calls.
#[derive(Deserialize)]
pub(crate) struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct ChatUsage {
    pub total_tokens: Option<u64>,
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn classify(&self, prompt: &str) -> Result<String, MurmurError> {
        let raw = self.complete(&self.model, prompt).await?;
        Ok(extract_label(&raw))
    }

    async fn generate(&self, prompt: &str) -> Result<GeneratedContent, MurmurError> {
        let raw = self.complete(&self.model_large, prompt).await?;
        Ok(parse_generated(&raw))
    }

    async fn is_available(&self) -> bool {
        if self.api_key.is_empty() {
            warn!("openai: no API key configured");
            return false;
        }
        let url = format!("{}/models", self.base_url);
        match self.client.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!("openai not available: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProviderConfig {
        ProviderConfig {
            base_url: "https://api.openai.com/v1/".into(),
            api_key: String::new(),
            model: "gpt-4o-mini".into(),
            model_large: "gpt-4o".into(),
        }
    }

    #[test]
    fn test_generator_from_config() {
        let g = OpenAiGenerator::from_config(&config(), "Be precise.");
        assert_eq!(g.name(), "openai");
        assert_eq!(g.base_url, "https://api.openai.com/v1");
        assert_eq!(g.model, "gpt-4o-mini");
        assert_eq!(g.model_large, "gpt-4o");
    }

    #[test]
    fn test_build_messages() {
        let messages = build_messages("Be precise.", "Should we reply?");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "Should we reply?");
    }

    #[test]
    fn test_build_messages_empty_system() {
        let messages = build_messages("", "hi");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"[RESPOND]"},"finish_reason":"stop"}],"model":"gpt-4o-mini","usage":{"total_tokens":42}}"#;
        let resp: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(first_choice_text(&resp).as_deref(), Some("[RESPOND]"));
        assert_eq!(resp.usage.as_ref().and_then(|u| u.total_tokens), Some(42));
    }

    #[test]
    fn test_null_content_parses_as_none() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let resp: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert!(first_choice_text(&resp).is_none());
    }

    #[tokio::test]
    async fn test_unavailable_without_api_key() {
        let g = OpenAiGenerator::from_config(&config(), "");
        assert!(!g.is_available().await);
    }
}
