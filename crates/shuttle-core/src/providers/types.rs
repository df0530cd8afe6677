//! Provider-agnostic types shared by every vendor integration

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Provider-agnostic chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Content of the most recent user message, if any
pub fn last_user_message(messages: &[ChatMessage]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == ChatRole::User)
        .map(|m| m.content.as_str())
}

/// Trait that all chat providers implement
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Registry identifier (e.g. "groq", "openrouter")
    fn provider_name(&self) -> &str;

    /// Model in use, or the comma-joined candidate list for multi-model providers
    fn model_name(&self) -> String;

    /// Environment variable holding this provider's credential
    fn credential_var(&self) -> &str;

    /// Whether the credential is present. Never performs I/O.
    fn is_configured(&self) -> bool;

    /// Send the full conversation and return the reply text
    async fn respond(&self, messages: &[ChatMessage]) -> Result<String, ProviderError>;
}

/// One vendor's "send messages, get text" capability for a given model.
///
/// Wire shapes stay behind this seam; provider variants only see text.
#[async_trait]
pub trait ChatTransport: Send + Sync + std::fmt::Debug {
    /// Vendor label used in logs and errors
    fn vendor(&self) -> &str;

    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String>;
}
