//! Provider key to adapter lookup

use indexmap::IndexMap;
use prism_config::{LlmConfig, ProviderConfig, ProviderType};

use crate::error::LlmError;
use crate::provider::anthropic::{DEFAULT_MAX_TOKENS, DEFAULT_VERSION};
use crate::provider::{AnthropicAdapter, GoogleAdapter, OpenAiChatAdapter, OpenAiResponsesAdapter, ProviderAdapter};

/// Adapters keyed by provider key
///
/// Built once at startup and immutable afterwards; lookups are the only entry
/// point callers need.
pub struct AdapterRegistry {
    adapters: IndexMap<String, Box<dyn ProviderAdapter>>,
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.adapters.iter().map(|(key, adapter)| (key, adapter.vendor())))
            .finish()
    }
}

impl AdapterRegistry {
    /// Registry with nothing registered
    pub fn empty() -> Self {
        Self {
            adapters: IndexMap::new(),
        }
    }

    /// Registry mapping the well-known provider keys to default adapters
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.insert("openai", OpenAiChatAdapter::new());
        registry.insert("openai-responses", OpenAiResponsesAdapter::default());
        registry.insert("azure", OpenAiChatAdapter::new());
        registry.insert("anthropic", AnthropicAdapter::default());
        registry.insert("google", GoogleAdapter::new());
        registry
    }

    /// Registry with one adapter per configured provider key
    pub fn from_config(config: &LlmConfig) -> Self {
        let mut registry = Self::empty();
        for (key, provider) in &config.providers {
            registry.adapters.insert(key.clone(), adapter_for(provider));
            tracing::debug!(provider = %key, kind = provider.provider_type.as_str(), "registered provider adapter");
        }
        registry
    }

    /// Register or replace an adapter
    pub fn insert(&mut self, key: impl Into<String>, adapter: impl ProviderAdapter + 'static) {
        self.adapters.insert(key.into(), Box::new(adapter));
    }

    /// Adapter for a provider key
    pub fn get(&self, provider: &str) -> Result<&dyn ProviderAdapter, LlmError> {
        self.adapters
            .get(provider)
            .map(Box::as_ref)
            .ok_or_else(|| LlmError::UnknownProvider {
                provider: provider.to_owned(),
            })
    }

    /// Registered provider keys in registration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn adapter_for(config: &ProviderConfig) -> Box<dyn ProviderAdapter> {
    match config.provider_type {
        ProviderType::OpenaiChat => Box::new(OpenAiChatAdapter::new()),
        ProviderType::OpenaiResponses => Box::new(OpenAiResponsesAdapter::new(config.store.unwrap_or(false))),
        ProviderType::Anthropic => Box::new(AnthropicAdapter::new(
            config.anthropic_version.as_deref().unwrap_or(DEFAULT_VERSION),
            config.default_max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        )),
        ProviderType::Google => Box::new(GoogleAdapter::new()),
    }
}
