//! OpenAI chat-completions transport
//!
//! Serves OpenAI itself and every endpoint that speaks the same wire format
//! (Groq, OpenRouter) through a configurable base URL.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::types::{ChatMessage, ChatTransport};

pub(crate) const TEMPERATURE: f32 = 0.7;
pub(crate) const MAX_TOKENS: u32 = 512;

/// OpenAI-compatible transport
pub struct OpenAiCompatTransport {
    client: Client,
    name: String,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for OpenAiCompatTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatTransport")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAiCompatTransport {
    /// - `name`: vendor label (e.g. "groq", "openrouter")
    /// - `base_url`: endpoint root including the version segment
    ///   (e.g. `https://api.groq.com/openai/v1`)
    pub fn new(name: &str, api_key: String, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            name: name.to_string(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn to_openai_messages(messages: &[ChatMessage]) -> Vec<OpenAiMessage<'_>> {
        messages
            .iter()
            .map(|m| OpenAiMessage {
                role: m.role.to_string(),
                content: &m.content,
            })
            .collect()
    }

    fn reply_text(&self, resp: OpenAiApiResponse) -> Result<String> {
        if let Some(error) = resp.error {
            return Err(anyhow!("{} returned an error payload: {}", self.name, error.message));
        }

        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("{} response had no choices", self.name))?;

        match choice.message.content {
            Some(content) if !content.is_empty() => Ok(content),
            _ => Err(anyhow!("{} response had no text content", self.name)),
        }
    }
}

#[async_trait]
impl ChatTransport for OpenAiCompatTransport {
    fn vendor(&self) -> &str {
        &self.name
    }

    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = OpenAiRequest {
            model,
            messages: Self::to_openai_messages(messages),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        debug!(
            "{} request: model={}, messages={}",
            self.name,
            model,
            body.messages.len()
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {} API", self.name))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!(
                "{} API request failed with status {}: {}",
                self.name,
                status,
                error_text
            ));
        }

        let api_response: OpenAiApiResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} API response", self.name))?;

        debug!(
            "{} response: choices={}",
            self.name,
            api_response.choices.len()
        );

        self.reply_text(api_response)
    }
}

// ── OpenAI wire types ──

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage<'a> {
    role: String,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAiApiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    error: Option<OpenAiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}
