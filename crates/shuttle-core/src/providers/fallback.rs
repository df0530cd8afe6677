//! Ordered model fallback for a single vendor

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::ProviderError;

use super::types::{ChatMessage, ChatTransport};

/// Default bound on a single candidate attempt
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(60);

/// One failed candidate in a fallback run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attempt {
    pub model: String,
    pub error: String,
}

impl Attempt {
    pub fn new(model: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            error: error.into(),
        }
    }
}

impl std::fmt::Display for Attempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.model, self.error)
    }
}

/// Run one bounded call against `model`. A timeout only fails this attempt.
pub(crate) async fn attempt(
    transport: &dyn ChatTransport,
    model: &str,
    messages: &[ChatMessage],
    limit: Duration,
) -> Result<String, String> {
    match tokio::time::timeout(limit, transport.complete(model, messages)).await {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(format!("{:#}", e)),
        Err(_) => Err(format!("timed out after {:?}", limit)),
    }
}

/// Tries candidate models in configured order until one answers.
///
/// First success wins; there is no retry of the same model and no racing.
#[derive(Debug)]
pub struct FallbackExecutor {
    transport: Arc<dyn ChatTransport>,
    /// Candidates in preference order (index 0 = primary)
    candidates: Vec<String>,
    attempt_timeout: Duration,
}

impl FallbackExecutor {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        candidates: Vec<String>,
    ) -> Result<Self, ProviderError> {
        if candidates.is_empty() {
            return Err(ProviderError::InvalidConfig(format!(
                "{} requires at least one candidate model",
                transport.vendor()
            )));
        }
        Ok(Self {
            transport,
            candidates,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        })
    }

    /// Set the bound applied to each individual candidate
    pub fn with_attempt_timeout(mut self, limit: Duration) -> Self {
        self.attempt_timeout = limit;
        self
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Send the conversation, falling over to the next candidate on error
    pub async fn run(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        self.run_logged(messages).await.map(|(text, _)| text)
    }

    /// Like [`run`](Self::run), also returning the failures that preceded
    /// the successful candidate.
    pub async fn run_logged(
        &self,
        messages: &[ChatMessage],
    ) -> Result<(String, Vec<Attempt>), ProviderError> {
        let vendor = self.transport.vendor();
        let mut failures = Vec::new();

        for (idx, model) in self.candidates.iter().enumerate() {
            debug!(
                "Trying {} model {} ({}/{})",
                vendor,
                model,
                idx + 1,
                self.candidates.len()
            );

            match attempt(
                self.transport.as_ref(),
                model,
                messages,
                self.attempt_timeout,
            )
            .await
            {
                Ok(text) => {
                    if idx > 0 {
                        info!(
                            "Request succeeded on fallback model {} after {} failure(s)",
                            model,
                            failures.len()
                        );
                    }
                    return Ok((text, failures));
                }
                Err(error) => {
                    warn!("{} model {} failed: {}", vendor, model, error);
                    failures.push(Attempt::new(model.as_str(), error));
                }
            }
        }

        Err(ProviderError::AggregateFallback {
            provider: vendor.to_string(),
            attempts: failures,
        })
    }
}
