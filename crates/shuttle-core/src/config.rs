//! Environment snapshot and active-provider resolution

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::info;

/// Provider used when `LLM_PROVIDER` is unset
pub const DEFAULT_PROVIDER: &str = "groq";

/// Variable selecting the default active provider
pub const PROVIDER_VAR: &str = "LLM_PROVIDER";

/// Every variable the core reads. Anything else in the environment is ignored.
pub const RECOGNIZED_VARS: &[&str] = &[
    "GROQ_API_KEY",
    "OPENAI_API_KEY",
    "ANTHROPIC_API_KEY",
    "OPENROUTER_API_KEY",
    "GROQ_MODEL",
    "OPENAI_MODEL",
    "ANTHROPIC_MODEL",
    "OPENROUTER_MODEL",
    PROVIDER_VAR,
];

/// Trim and lowercase a provider identifier
pub fn normalize_identifier(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

/// Immutable snapshot of the configuration variables.
///
/// Captured once at startup and handed to provider constructors, so credential
/// and model lookups never race with later changes to the process environment.
#[derive(Clone, Default)]
pub struct ProviderEnv {
    vars: HashMap<String, String>,
}

impl std::fmt::Debug for ProviderEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.vars.keys().collect();
        names.sort();
        let mut map = f.debug_map();
        for name in names {
            let value = &self.vars[name];
            if is_secret(name) {
                map.entry(name, &mask_secret(value));
            } else {
                map.entry(name, value);
            }
        }
        map.finish()
    }
}

impl ProviderEnv {
    /// Read the recognised variables from the process environment
    pub fn from_process() -> Self {
        Self::from_pairs(
            RECOGNIZED_VARS
                .iter()
                .filter_map(|name| std::env::var(name).ok().map(|value| (*name, value))),
        )
    }

    /// Build a snapshot from explicit pairs (tests, embedding)
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of `name`, trimmed; blank values count as unset
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Comma-separated ordered list held in `name`, empty entries dropped
    pub fn list(&self, name: &str) -> Option<Vec<String>> {
        let items: Vec<String> = self
            .get(name)?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if items.is_empty() { None } else { Some(items) }
    }
}

fn is_secret(name: &str) -> bool {
    name.ends_with("_API_KEY") || name.ends_with("_TOKEN")
}

/// Mask a secret for safe display in Debug output and logs.
/// Shows the first 3 and last 4 chars for values longer than 7 chars,
/// otherwise "***".
pub fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "(empty)".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() > 7 {
        let prefix: String = chars[..3].iter().collect();
        let suffix: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else {
        "***".to_string()
    }
}

/// Holds the process-wide default provider identifier.
///
/// Reads and writes go through a lock; a request may carry its own provider
/// which takes precedence over the default (see [`resolve`](Self::resolve)).
#[derive(Debug)]
pub struct ConfigResolver {
    active: RwLock<String>,
}

impl ConfigResolver {
    pub fn new(default_provider: &str) -> Self {
        let normalized = normalize_identifier(default_provider);
        let active = if normalized.is_empty() {
            DEFAULT_PROVIDER.to_string()
        } else {
            normalized
        };
        Self {
            active: RwLock::new(active),
        }
    }

    /// Default from `LLM_PROVIDER`, falling back to [`DEFAULT_PROVIDER`]
    pub fn from_env(env: &ProviderEnv) -> Self {
        Self::new(env.get(PROVIDER_VAR).unwrap_or(DEFAULT_PROVIDER))
    }

    pub fn current_provider(&self) -> String {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Overwrite the default immediately; returns the normalized identifier
    pub fn set_provider(&self, identifier: &str) -> String {
        let normalized = normalize_identifier(identifier);
        let mut active = self
            .active
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if *active != normalized {
            info!("Switching active provider from {} to {}", active, normalized);
        }
        *active = normalized.clone();
        normalized
    }

    /// Identifier for one request: a non-blank override wins over the default
    pub fn resolve(&self, requested: Option<&str>) -> String {
        match requested.map(normalize_identifier) {
            Some(name) if !name.is_empty() => name,
            _ => self.current_provider(),
        }
    }
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new(DEFAULT_PROVIDER)
    }
}
