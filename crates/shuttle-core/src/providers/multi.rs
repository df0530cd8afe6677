//! Provider that degrades across an ordered list of interchangeable models

use async_trait::async_trait;
use std::time::Duration;

use crate::config::ProviderEnv;
use crate::error::ProviderError;

use super::descriptor::ProviderDescriptor;
use super::fallback::{Attempt, FallbackExecutor};
use super::types::{ChatMessage, LlmProvider};

/// Multi-model provider backed by a [`FallbackExecutor`]
#[derive(Debug)]
pub struct MultiModelProvider {
    name: String,
    credential_var: String,
    candidates: Vec<String>,
    executor: Option<FallbackExecutor>,
}

impl MultiModelProvider {
    /// `candidates` are kept for diagnostics even when unconfigured; a
    /// configured provider takes them from its executor.
    pub fn new(
        name: impl Into<String>,
        credential_var: impl Into<String>,
        candidates: Vec<String>,
        executor: Option<FallbackExecutor>,
    ) -> Self {
        let candidates = executor
            .as_ref()
            .map(|e| e.candidates().to_vec())
            .unwrap_or(candidates);
        Self {
            name: name.into(),
            credential_var: credential_var.into(),
            candidates,
            executor,
        }
    }

    /// Resolve credential and candidate list once, at construction
    pub fn from_env(
        descriptor: &ProviderDescriptor,
        env: &ProviderEnv,
    ) -> Result<Self, ProviderError> {
        let candidates = descriptor.candidate_models(env);
        let executor = match descriptor.credential(env) {
            Some(key) => Some(FallbackExecutor::new(
                descriptor.transport(key)?,
                candidates.clone(),
            )?),
            None => None,
        };
        Ok(Self::new(
            descriptor.identifier,
            descriptor.credential_var,
            candidates,
            executor,
        ))
    }

    pub fn with_attempt_timeout(mut self, limit: Duration) -> Self {
        self.executor = self.executor.map(|e| e.with_attempt_timeout(limit));
        self
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    fn executor(&self) -> Result<&FallbackExecutor, ProviderError> {
        self.executor
            .as_ref()
            .ok_or_else(|| ProviderError::not_configured(&self.name, &self.credential_var))
    }

    /// Reply plus the candidates that failed before it
    pub async fn respond_logged(
        &self,
        messages: &[ChatMessage],
    ) -> Result<(String, Vec<Attempt>), ProviderError> {
        self.executor()?.run_logged(messages).await
    }
}

#[async_trait]
impl LlmProvider for MultiModelProvider {
    fn provider_name(&self) -> &str {
        &self.name
    }

    fn model_name(&self) -> String {
        self.candidates.join(", ")
    }

    fn credential_var(&self) -> &str {
        &self.credential_var
    }

    fn is_configured(&self) -> bool {
        self.executor.is_some()
    }

    async fn respond(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        self.executor()?.run(messages).await
    }
}
