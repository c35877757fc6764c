
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{ChatMessage, ChatModel};
use crate::ChatbotError;
use crate::config::LlmConfig;

/// Sampling temperature sent with every request
const TEMPERATURE: f32 = 0.7;

/// Client for an OpenAI-compatible chat completions endpoint (Groq by default)
#[derive(Debug, Clone)]
pub struct GroqClient {
    endpoint: Url,
    model: String,
    api_key: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

impl GroqClient {
    #[inline]
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self> {
        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&endpoint)
            .with_context(|| format!("Invalid chat completions URL: {}", endpoint))?;

        Ok(Self {
            endpoint,
            model: config.model.clone(),
            api_key,
            agent: ureq::Agent::new_with_defaults(),
        })
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send the messages and return the first choice's text
    ///
    /// Blocks the calling thread until the provider answers.
    #[inline]
    pub fn complete_blocking(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature: TEMPERATURE,
        };

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize completion request")?;

        debug!(
            "Requesting completion from {} with {} messages",
            self.model,
            messages.len()
        );

        let response_text = self
            .agent
            .post(self.endpoint.as_str())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(describe_error)
            .context("Chat completion request failed")?;

        let response: CompletionResponse = serde_json::from_str(&response_text)
            .context("Failed to parse chat completion response")?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("Chat completion response has no content"))?;

        debug!("Received completion of {} chars", content.len());
        Ok(content)
    }
}

#[async_trait]
impl ChatModel for GroqClient {
    async fn complete(&self, messages: Vec<ChatMessage>) -> crate::Result<String> {
        let client = self.clone();
        tokio::task::spawn_blocking(move || client.complete_blocking(&messages))
            .await
            .map_err(|e| ChatbotError::Llm(format!("Completion task failed: {}", e)))?
            .map_err(|e| ChatbotError::Llm(format!("{:#}", e)))
    }
}

fn describe_error(error: ureq::Error) -> anyhow::Error {
    match error {
        ureq::Error::StatusCode(status) => anyhow::anyhow!("LLM provider returned HTTP {}", status),
        other => anyhow::anyhow!("Request error: {}", other),
    }
}
