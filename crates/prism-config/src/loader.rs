use std::path::Path;

use secrecy::ExposeSecret;

use crate::{Config, ProviderType};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `${VAR}` placeholders, then deserializes and
    /// validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let config = Self::parse(&raw)?;
        tracing::debug!(
            path = %path.display(),
            providers = config.llm.providers.len(),
            "loaded configuration"
        );
        Ok(config)
    }

    /// Parse and validate configuration text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if no provider is configured or a provider carries
    /// settings that do not apply to its type
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.llm.providers.is_empty() {
            anyhow::bail!("at least one LLM provider must be configured");
        }

        for (name, provider) in &self.llm.providers {
            if let Some(url) = &provider.base_url
                && !matches!(url.scheme(), "http" | "https")
            {
                anyhow::bail!("provider '{name}' base_url must be http or https, got '{}'", url.scheme());
            }

            if provider.api_key.as_ref().is_some_and(|k| k.expose_secret().is_empty()) {
                anyhow::bail!("provider '{name}' api_key must not be empty");
            }

            let kind = provider.provider_type;
            if kind != ProviderType::Anthropic
                && (provider.anthropic_version.is_some() || provider.default_max_tokens.is_some())
            {
                anyhow::bail!(
                    "provider '{name}' of type {} cannot set anthropic_version or default_max_tokens",
                    kind.as_str()
                );
            }
            if provider.default_max_tokens == Some(0) {
                anyhow::bail!("provider '{name}' default_max_tokens must be greater than 0");
            }

            if kind != ProviderType::OpenaiResponses && provider.store.is_some() {
                anyhow::bail!("provider '{name}' of type {} cannot set store", kind.as_str());
            }
        }

        Ok(())
    }
}
