//! Provider bound to exactly one model

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ProviderEnv;
use crate::error::ProviderError;

use super::descriptor::ProviderDescriptor;
use super::fallback::{DEFAULT_ATTEMPT_TIMEOUT, attempt};
use super::types::{ChatMessage, ChatTransport, LlmProvider};

/// Single-model provider. Unconfigured when no transport could be bound
/// because the credential is missing.
#[derive(Debug)]
pub struct SingleModelProvider {
    name: String,
    credential_var: String,
    model: String,
    transport: Option<Arc<dyn ChatTransport>>,
    timeout: Duration,
}

impl SingleModelProvider {
    pub fn new(
        name: impl Into<String>,
        credential_var: impl Into<String>,
        model: impl Into<String>,
        transport: Option<Arc<dyn ChatTransport>>,
    ) -> Self {
        Self {
            name: name.into(),
            credential_var: credential_var.into(),
            model: model.into(),
            transport,
            timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    /// Resolve credential and model override once, at construction
    pub fn from_env(
        descriptor: &ProviderDescriptor,
        env: &ProviderEnv,
    ) -> Result<Self, ProviderError> {
        let transport = descriptor
            .credential(env)
            .map(|key| descriptor.transport(key))
            .transpose()?;
        Ok(Self::new(
            descriptor.identifier,
            descriptor.credential_var,
            descriptor.model(env),
            transport,
        ))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl LlmProvider for SingleModelProvider {
    fn provider_name(&self) -> &str {
        &self.name
    }

    fn model_name(&self) -> String {
        self.model.clone()
    }

    fn credential_var(&self) -> &str {
        &self.credential_var
    }

    fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    async fn respond(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        let transport = self
            .transport
            .as_ref()
            .ok_or_else(|| ProviderError::not_configured(&self.name, &self.credential_var))?;

        attempt(transport.as_ref(), &self.model, messages, self.timeout)
            .await
            .map_err(|message| ProviderError::upstream(&self.name, &self.model, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::descriptor::{ANTHROPIC, GROQ};
    use crate::providers::types::mock::ScriptedTransport;

    #[test]
    fn test_unconfigured_without_credential() {
        let provider = SingleModelProvider::from_env(&GROQ, &ProviderEnv::default()).unwrap();
        assert!(!provider.is_configured());
        assert_eq!(provider.model_name(), "llama3-8b-8192");
        assert_eq!(provider.credential_var(), "GROQ_API_KEY");
    }

    #[test]
    fn test_configured_with_credential_and_override() {
        let env = ProviderEnv::from_pairs([
            ("ANTHROPIC_API_KEY", "sk-ant-123"),
            ("ANTHROPIC_MODEL", "claude-3-haiku"),
        ]);
        let provider = SingleModelProvider::from_env(&ANTHROPIC, &env).unwrap();
        assert!(provider.is_configured());
        assert_eq!(provider.provider_name(), "anthropic");
        assert_eq!(provider.model_name(), "claude-3-haiku");
    }

    #[tokio::test]
    async fn test_respond_unconfigured_names_credential() {
        let provider = SingleModelProvider::from_env(&GROQ, &ProviderEnv::default()).unwrap();
        let err = provider
            .respond(&[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured { .. }));
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[tokio::test]
    async fn test_respond_uses_configured_model() {
        let transport = Arc::new(ScriptedTransport::new().reply("gpt-4o-mini", "hello"));
        let provider = SingleModelProvider::new(
            "openai",
            "OPENAI_API_KEY",
            "gpt-4o-mini",
            Some(transport.clone() as Arc<dyn ChatTransport>),
        );
        assert_eq!(
            provider.respond(&[ChatMessage::user("hi")]).await.unwrap(),
            "hello"
        );
        assert_eq!(transport.calls(), vec!["gpt-4o-mini"]);
    }

    #[tokio::test]
    async fn test_respond_wraps_vendor_failure() {
        let transport = Arc::new(ScriptedTransport::new().fail("m", "status 401: unauthorized"));
        let provider = SingleModelProvider::new(
            "openai",
            "OPENAI_API_KEY",
            "m",
            Some(transport as Arc<dyn ChatTransport>),
        );
        let err = provider
            .respond(&[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Upstream { .. }));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_respond_times_out() {
        let transport = Arc::new(ScriptedTransport::new().hang("m"));
        let provider = SingleModelProvider::new(
            "groq",
            "GROQ_API_KEY",
            "m",
            Some(transport as Arc<dyn ChatTransport>),
        )
        .with_timeout(Duration::from_millis(20));
        let err = provider
            .respond(&[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
