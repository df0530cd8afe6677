//! Offline provider for tests and integration harnesses

use async_trait::async_trait;
use serde_json::json;

use crate::error::ProviderError;

use super::types::{ChatMessage, LlmProvider, last_user_message};

/// Always configured, never performs I/O. Replies with a fenced intent payload
/// whose `question` echoes the most recent user message.
#[derive(Debug, Clone)]
pub struct EchoProvider {
    name: String,
}

impl EchoProvider {
    pub const IDENTIFIER: &'static str = "echo";

    pub fn new() -> Self {
        Self {
            name: Self::IDENTIFIER.to_string(),
        }
    }

    /// Register under a custom identifier
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for EchoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for EchoProvider {
    fn provider_name(&self) -> &str {
        &self.name
    }

    fn model_name(&self) -> String {
        "echo-model".to_string()
    }

    fn credential_var(&self) -> &str {
        ""
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn respond(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        let question = last_user_message(messages).unwrap_or("No question");
        let payload = json!({
            "intent": "echo",
            "template": "classic_check",
            "confidence": 1.0,
            "clarification_required": true,
            "question": question,
            "parameters": null,
        });
        Ok(format!("```json\n{:#}\n```", payload))
    }
}
