use std::fmt;

use serde::{Deserialize, Serialize};

/// Upstream wire protocol an adapter speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vendor {
    /// `OpenAI` Chat Completions API (and compatible servers)
    OpenAiChat,
    /// `OpenAI` Responses API
    OpenAiResponses,
    /// Anthropic Messages API
    Anthropic,
    /// Google Generative Language API
    Google,
}

impl Vendor {
    /// Stable identifier used in logs and error messages
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAiChat => "openai_chat",
            Self::OpenAiResponses => "openai_responses",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
        }
    }

    /// Provider tags a tool may carry to declare affinity with this vendor
    ///
    /// Both `OpenAI` protocols belong to the same family, so a tool tagged
    /// `openai` is kept for either of them.
    pub const fn provider_tags(self) -> &'static [&'static str] {
        match self {
            Self::OpenAiChat | Self::OpenAiResponses => &["openai", "azure", "azure_openai"],
            Self::Anthropic => &["anthropic", "claude"],
            Self::Google => &["google", "gemini", "vertex"],
        }
    }

    /// Whether a tool's provider tag names this vendor's family
    pub fn owns_provider_tag(self, tag: &str) -> bool {
        self.provider_tags().iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
