use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Top-level LLM configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// Provider configurations keyed by provider key
    #[serde(default)]
    pub providers: IndexMap<String, ProviderConfig>,
}

/// Configuration for a single provider key
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Wire protocol the provider speaks
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    /// API key for authentication
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// `anthropic-version` header (anthropic only)
    #[serde(default)]
    pub anthropic_version: Option<String>,
    /// `max_tokens` sent when the caller sets none (anthropic only)
    #[serde(default)]
    pub default_max_tokens: Option<u32>,
    /// Let `OpenAI` keep responses (`openai_responses` only)
    #[serde(default)]
    pub store: Option<bool>,
}

/// Supported provider protocols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    /// `OpenAI` Chat Completions and compatible servers, Azure included
    OpenaiChat,
    /// `OpenAI` Responses API
    OpenaiResponses,
    /// Anthropic Messages API
    Anthropic,
    /// Google Generative Language API
    Google,
}

impl ProviderType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenaiChat => "openai_chat",
            Self::OpenaiResponses => "openai_responses",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
        }
    }
}
