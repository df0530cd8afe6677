//! Error taxonomy for provider resolution and upstream calls

use thiserror::Error;

use crate::providers::fallback::Attempt;

/// Errors escalated out of the core.
///
/// Extraction failures are deliberately absent: they degrade to a reply
/// without a structured payload (see [`crate::extract::ExtractionErrorKind`]).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Unknown provider '{name}'. Available: {}", .available.join(", "))]
    UnknownProvider { name: String, available: Vec<String> },

    #[error("Provider '{provider}' is not configured. Set the {credential} environment variable.")]
    NotConfigured { provider: String, credential: String },

    #[error("{provider} request failed for model {model}: {message}")]
    Upstream {
        provider: String,
        model: String,
        message: String,
    },

    #[error("All {} candidate models failed for {provider}: {}", .attempts.len(), format_attempts(.attempts))]
    AggregateFallback {
        provider: String,
        attempts: Vec<Attempt>,
    },

    #[error("Invalid provider configuration: {0}")]
    InvalidConfig(String),
}

impl ProviderError {
    pub fn not_configured(provider: impl Into<String>, credential: impl Into<String>) -> Self {
        Self::NotConfigured {
            provider: provider.into(),
            credential: credential.into(),
        }
    }

    pub fn upstream(
        provider: impl Into<String>,
        model: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Upstream {
            provider: provider.into(),
            model: model.into(),
            message: message.into(),
        }
    }

    /// Whether the caller sent something we cannot serve (as opposed to a
    /// server-side configuration or upstream failure)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnknownProvider { .. })
    }

    /// Failed attempts carried by an aggregate fallback failure
    pub fn attempts(&self) -> &[Attempt] {
        match self {
            Self::AggregateFallback { attempts, .. } => attempts,
            _ => &[],
        }
    }
}

fn format_attempts(attempts: &[Attempt]) -> String {
    attempts
        .iter()
        .enumerate()
        .map(|(idx, attempt)| format!("[{}] {}", idx + 1, attempt))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_lists_available() {
        let err = ProviderError::UnknownProvider {
            name: "bogus".to_string(),
            available: vec!["anthropic".to_string(), "groq".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Unknown provider 'bogus'. Available: anthropic, groq"
        );
        assert!(err.is_client_error());
    }

    #[test]
    fn test_not_configured_names_credential() {
        let err = ProviderError::not_configured("openai", "OPENAI_API_KEY");
        assert!(err.to_string().contains("OPENAI_API_KEY"));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_aggregate_preserves_attempt_order() {
        let err = ProviderError::AggregateFallback {
            provider: "openrouter".to_string(),
            attempts: vec![
                Attempt::new("m1", "connection refused"),
                Attempt::new("m2", "status 500"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("All 2 candidate models failed for openrouter"));
        let first = msg.find("m1: connection refused").unwrap();
        let second = msg.find("m2: status 500").unwrap();
        assert!(first < second);
        assert_eq!(err.attempts().len(), 2);
    }

    #[test]
    fn test_attempts_empty_for_other_kinds() {
        let err = ProviderError::upstream("groq", "llama3-8b-8192", "boom");
        assert!(err.attempts().is_empty());
        assert_eq!(
            err.to_string(),
            "groq request failed for model llama3-8b-8192: boom"
        );
    }
}
