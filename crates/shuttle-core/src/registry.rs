//! Registry mapping provider identifiers to constructors

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use crate::config::{ProviderEnv, normalize_identifier};
use crate::error::ProviderError;
use crate::providers::descriptor::BUILTIN;
use crate::providers::{LlmProvider, MultiModelProvider, SingleModelProvider};

/// Builds a provider instance from the environment snapshot
pub type ProviderConstructor =
    Arc<dyn Fn(&ProviderEnv) -> Result<Box<dyn LlmProvider>, ProviderError> + Send + Sync>;

/// Configuration state of one registered provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub configured: bool,
    pub model: Option<String>,
}

/// Registry of available providers.
///
/// Owned explicitly and shared via `Arc`; extension at runtime goes through
/// [`register`](Self::register), lookups take a shared lock.
pub struct ProviderRegistry {
    constructors: RwLock<HashMap<String, ProviderConstructor>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.identifiers())
            .finish()
    }
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            constructors: RwLock::new(HashMap::new()),
        }
    }

    /// Registry holding groq, openai, anthropic and openrouter
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        for &descriptor in BUILTIN {
            if descriptor.multi_model {
                registry.register(descriptor.identifier, move |env| {
                    Ok(Box::new(MultiModelProvider::from_env(&descriptor, env)?))
                });
            } else {
                registry.register(descriptor.identifier, move |env| {
                    Ok(Box::new(SingleModelProvider::from_env(&descriptor, env)?))
                });
            }
        }
        registry
    }

    /// Insert or overwrite the constructor for `identifier` (case-insensitive).
    /// Last registration wins.
    pub fn register<F>(&self, identifier: &str, constructor: F)
    where
        F: Fn(&ProviderEnv) -> Result<Box<dyn LlmProvider>, ProviderError> + Send + Sync + 'static,
    {
        let name = normalize_identifier(identifier);
        debug!("Registering provider: {}", name);
        let previous = self
            .constructors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.clone(), Arc::new(constructor));
        if previous.is_some() {
            debug!("Provider {} replaced an earlier registration", name);
        }
    }

    /// Construct the provider registered as `identifier` and make sure it has
    /// its credential before handing it out.
    pub fn get(
        &self,
        identifier: &str,
        env: &ProviderEnv,
    ) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        let name = normalize_identifier(identifier);
        let Some(constructor) = self.constructor(&name) else {
            return Err(ProviderError::UnknownProvider {
                available: self.identifiers(),
                name,
            });
        };

        let provider = constructor(env)?;
        if !provider.is_configured() {
            return Err(ProviderError::not_configured(
                &name,
                provider.credential_var(),
            ));
        }

        debug!(
            "Resolved provider {} (model: {})",
            name,
            provider.model_name()
        );
        Ok(Arc::from(provider))
    }

    /// Clone the constructor out so it never runs under the lock
    fn constructor(&self, name: &str) -> Option<ProviderConstructor> {
        self.constructors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Registered identifiers, sorted
    pub fn identifiers(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .constructors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.constructors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&normalize_identifier(identifier))
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.constructors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configuration state of every registered provider. Constructs each one
    /// but performs no network I/O.
    pub fn statuses(&self, env: &ProviderEnv) -> Vec<ProviderStatus> {
        self.identifiers()
            .into_iter()
            .map(|name| {
                match self.constructor(&name).map(|c| c(env)) {
                    Some(Ok(provider)) => ProviderStatus {
                        configured: provider.is_configured(),
                        model: Some(provider.model_name()),
                        name,
                    },
                    _ => ProviderStatus {
                        name,
                        configured: false,
                        model: None,
                    },
                }
            })
            .collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
