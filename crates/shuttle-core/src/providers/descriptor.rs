//! Static descriptions of the built-in vendor integrations

use std::sync::Arc;

use crate::config::ProviderEnv;
use crate::error::ProviderError;

use super::anthropic::AnthropicTransport;
use super::openai::OpenAiCompatTransport;
use super::types::ChatTransport;

/// Which wire format a vendor speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    OpenAi,
    Anthropic,
}

/// One vendor integration: where its credential and model override live,
/// which models it uses by default and how to reach it.
#[derive(Debug, Clone, Copy)]
pub struct ProviderDescriptor {
    pub identifier: &'static str,
    pub credential_var: &'static str,
    pub model_var: &'static str,
    /// Preference-ordered defaults; the first is the default model
    pub default_models: &'static [&'static str],
    pub base_url: &'static str,
    pub wire: WireFormat,
    /// Serve requests by degrading across the candidate list
    pub multi_model: bool,
}

pub const GROQ: ProviderDescriptor = ProviderDescriptor {
    identifier: "groq",
    credential_var: "GROQ_API_KEY",
    model_var: "GROQ_MODEL",
    default_models: &["llama3-8b-8192"],
    base_url: "https://api.groq.com/openai/v1",
    wire: WireFormat::OpenAi,
    multi_model: false,
};

pub const OPENAI: ProviderDescriptor = ProviderDescriptor {
    identifier: "openai",
    credential_var: "OPENAI_API_KEY",
    model_var: "OPENAI_MODEL",
    default_models: &["gpt-4o-mini"],
    base_url: "https://api.openai.com/v1",
    wire: WireFormat::OpenAi,
    multi_model: false,
};

pub const ANTHROPIC: ProviderDescriptor = ProviderDescriptor {
    identifier: "anthropic",
    credential_var: "ANTHROPIC_API_KEY",
    model_var: "ANTHROPIC_MODEL",
    default_models: &["claude-3-5-sonnet-20241022"],
    base_url: "https://api.anthropic.com",
    wire: WireFormat::Anthropic,
    multi_model: false,
};

/// Unified gateway; its model variable may hold a comma-separated fallback list
pub const OPENROUTER: ProviderDescriptor = ProviderDescriptor {
    identifier: "openrouter",
    credential_var: "OPENROUTER_API_KEY",
    model_var: "OPENROUTER_MODEL",
    default_models: &["groq/groq-4.1-fast"],
    base_url: "https://openrouter.ai/api/v1",
    wire: WireFormat::OpenAi,
    multi_model: true,
};

/// Every built-in vendor, in registration order
pub const BUILTIN: &[ProviderDescriptor] = &[GROQ, OPENAI, ANTHROPIC, OPENROUTER];

impl ProviderDescriptor {
    pub fn default_model(&self) -> &'static str {
        self.default_models.first().copied().unwrap_or_default()
    }

    /// Single model: the override verbatim, else the default
    pub fn model(&self, env: &ProviderEnv) -> String {
        env.get(self.model_var)
            .unwrap_or(self.default_model())
            .to_string()
    }

    /// Ordered candidates: the comma-separated override, else the defaults
    pub fn candidate_models(&self, env: &ProviderEnv) -> Vec<String> {
        env.list(self.model_var).unwrap_or_else(|| {
            self.default_models
                .iter()
                .map(|m| m.to_string())
                .collect()
        })
    }

    pub fn credential(&self, env: &ProviderEnv) -> Option<String> {
        env.get(self.credential_var).map(str::to_string)
    }

    /// Build the transport for this vendor, bound to `api_key`
    pub fn transport(&self, api_key: String) -> Result<Arc<dyn ChatTransport>, ProviderError> {
        let transport: Arc<dyn ChatTransport> = match self.wire {
            WireFormat::OpenAi => Arc::new(
                OpenAiCompatTransport::new(self.identifier, api_key, self.base_url)
                    .map_err(|e| ProviderError::InvalidConfig(format!("{:#}", e)))?,
            ),
            WireFormat::Anthropic => Arc::new(
                AnthropicTransport::new(api_key, self.base_url)
                    .map_err(|e| ProviderError::InvalidConfig(format!("{:#}", e)))?,
            ),
        };
        Ok(transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_override_and_default() {
        let env = ProviderEnv::default();
        assert_eq!(GROQ.model(&env), "llama3-8b-8192");
        let env = ProviderEnv::from_pairs([("GROQ_MODEL", "llama-3.1-70b")]);
        assert_eq!(GROQ.model(&env), "llama-3.1-70b");
    }

    #[test]
    fn test_candidate_models_from_comma_list() {
        let env = ProviderEnv::from_pairs([("OPENROUTER_MODEL", "a/x, b/y,c/z")]);
        assert_eq!(OPENROUTER.candidate_models(&env), vec!["a/x", "b/y", "c/z"]);
        assert_eq!(
            OPENROUTER.candidate_models(&ProviderEnv::default()),
            vec!["groq/groq-4.1-fast"]
        );
    }

    #[test]
    fn test_credential_lookup() {
        let env = ProviderEnv::from_pairs([("ANTHROPIC_API_KEY", "sk-ant-x")]);
        assert_eq!(ANTHROPIC.credential(&env).as_deref(), Some("sk-ant-x"));
        assert_eq!(OPENAI.credential(&env), None);
    }

    #[test]
    fn test_only_openrouter_is_multi_model() {
        let multi: Vec<&str> = BUILTIN
            .iter()
            .filter(|d| d.multi_model)
            .map(|d| d.identifier)
            .collect();
        assert_eq!(multi, vec!["openrouter"]);
    }

    #[test]
    fn test_transport_vendor_matches_identifier() {
        for descriptor in [GROQ, OPENAI, ANTHROPIC, OPENROUTER] {
            let transport = descriptor.transport("key".to_string()).unwrap();
            assert_eq!(transport.vendor(), descriptor.identifier);
        }
    }
}
