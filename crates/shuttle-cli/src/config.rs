use anyhow::{Context, Result};
use serde::Serialize;
use shuttle_core::providers::descriptor::BUILTIN;
use shuttle_core::{ConfigResolver, DEFAULT_SYSTEM_PROMPT, ProviderEnv, mask_secret};
use std::path::Path;

/// Resolved configuration as shown by `shuttle config`
#[derive(Debug, Serialize)]
pub struct Settings {
    pub provider: String,
    pub providers: Vec<ProviderSettings>,
}

#[derive(Debug, Serialize)]
pub struct ProviderSettings {
    pub name: &'static str,
    pub credential_var: &'static str,
    /// Masked; `None` when the variable is unset
    pub api_key: Option<String>,
    pub models: Vec<String>,
    pub base_url: &'static str,
}

impl Settings {
    pub fn resolve(env: &ProviderEnv) -> Self {
        let providers = BUILTIN
            .iter()
            .map(|descriptor| ProviderSettings {
                name: descriptor.identifier,
                credential_var: descriptor.credential_var,
                api_key: descriptor.credential(env).map(|key| mask_secret(&key)),
                models: if descriptor.multi_model {
                    descriptor.candidate_models(env)
                } else {
                    vec![descriptor.model(env)]
                },
                base_url: descriptor.base_url,
            })
            .collect();

        Self {
            provider: ConfigResolver::from_env(env).current_provider(),
            providers,
        }
    }
}

/// System prompt from `path`, or the built-in one
pub fn load_system_prompt(path: Option<&Path>) -> Result<String> {
    let Some(path) = path else {
        return Ok(DEFAULT_SYSTEM_PROMPT.to_string());
    };
    let prompt = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read system prompt: {}", path.display()))?;
    let prompt = prompt.trim();
    if prompt.is_empty() {
        anyhow::bail!("System prompt file is empty: {}", path.display());
    }
    Ok(prompt.to_string())
}
