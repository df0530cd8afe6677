//! Request-level orchestration: resolve provider, respond, extract

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{ConfigResolver, ProviderEnv};
use crate::error::ProviderError;
use crate::extract::extract;
use crate::providers::{ChatMessage, ChatRole};
use crate::registry::{ProviderRegistry, ProviderStatus};

/// System prompt used when the operator does not supply one
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful design assistant. \
When the user asks for design parameters, answer with a single JSON object.";

/// Inbound chat request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// Per-request provider; overrides the process-wide default
    #[serde(default)]
    pub provider: Option<String>,
}

/// Successful reply: raw text plus the recovered payload, if any
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    pub structured: Option<Value>,
}

/// Liveness report; reads the resolver only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub status: String,
    pub provider: String,
}

/// Serves chat requests over a registry and a resolver
#[derive(Debug, Clone)]
pub struct ChatService {
    registry: Arc<ProviderRegistry>,
    resolver: Arc<ConfigResolver>,
    env: Arc<ProviderEnv>,
    system_prompt: String,
}

impl ChatService {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        resolver: Arc<ConfigResolver>,
        env: Arc<ProviderEnv>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            resolver,
            env,
            system_prompt: system_prompt.into(),
        }
    }

    /// Built-in providers, defaults from `env`, [`DEFAULT_SYSTEM_PROMPT`]
    pub fn from_env(env: ProviderEnv) -> Self {
        let resolver = ConfigResolver::from_env(&env);
        Self::new(
            Arc::new(ProviderRegistry::with_builtin()),
            Arc::new(resolver),
            Arc::new(env),
            DEFAULT_SYSTEM_PROMPT,
        )
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn resolver(&self) -> &Arc<ConfigResolver> {
        &self.resolver
    }

    pub fn env(&self) -> &ProviderEnv {
        &self.env
    }

    /// Prepend the system prompt unless the conversation already has one
    fn ensure_system_prompt(&self, mut messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
        if !messages.iter().any(|m| m.role == ChatRole::System) {
            messages.insert(0, ChatMessage::system(self.system_prompt.clone()));
        }
        messages
    }

    /// Resolve the provider, send the conversation and recover the payload.
    ///
    /// Resolution errors surface before any network call; extraction problems
    /// never fail the request.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatReply, ProviderError> {
        let name = self.resolver.resolve(request.provider.as_deref());
        let provider = self.registry.get(&name, &self.env)?;
        let messages = self.ensure_system_prompt(request.messages);

        debug!(
            "Chat via {} ({}), messages={}",
            provider.provider_name(),
            provider.model_name(),
            messages.len()
        );

        let reply = provider.respond(&messages).await?;
        let extraction = extract(&reply);

        Ok(ChatReply {
            reply: extraction.raw_text,
            structured: extraction.structured,
        })
    }

    pub fn status(&self) -> Status {
        Status {
            status: "ok".to_string(),
            provider: self.resolver.current_provider(),
        }
    }

    /// Change the process-wide default after checking the provider is usable
    pub fn switch_provider(&self, identifier: &str) -> Result<String, ProviderError> {
        let provider = self.registry.get(identifier, &self.env)?;
        let name = self.resolver.set_provider(identifier);
        info!(
            "Active provider is now {} ({})",
            name,
            provider.model_name()
        );
        Ok(name)
    }

    pub fn providers(&self) -> Vec<ProviderStatus> {
        self.registry.statuses(&self.env)
    }
}
