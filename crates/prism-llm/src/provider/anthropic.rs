//! Anthropic Messages API adapter

use http::Method;
use http::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};

use super::{ProviderAdapter, base_url, endpoint, invalid_request, json_headers, secret_header, to_body};
use crate::convert::ResponseNormalizer;
use crate::convert::anthropic::{AnthropicNormalizer, JSON_TOOL_NAME, build_request};
use crate::error::LlmError;
use crate::protocol::anthropic::AnthropicTool;
use crate::tools::{AnthropicToolConverter, ToolSchemaConverter};
use crate::types::{CompletionOptions, Message, ModelDescriptor, Vendor, VendorRequest};

/// Default Anthropic API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Anthropic API version header value
pub const DEFAULT_VERSION: &str = "2023-06-01";

/// `max_tokens` sent when the caller sets none; Anthropic requires one
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Messages API adapter
#[derive(Debug, Clone)]
pub struct AnthropicAdapter {
    tools: AnthropicToolConverter,
    version: String,
    default_max_tokens: u32,
}

impl AnthropicAdapter {
    pub fn new(version: impl Into<String>, default_max_tokens: u32) -> Self {
        Self {
            tools: AnthropicToolConverter,
            version: version.into(),
            default_max_tokens,
        }
    }
}

impl Default for AnthropicAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION, DEFAULT_MAX_TOKENS)
    }
}

impl ProviderAdapter for AnthropicAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::Anthropic
    }

    fn create_completion_request(
        &self,
        model: &ModelDescriptor,
        messages: &[Message],
        api_key: &SecretString,
        options: &CompletionOptions,
    ) -> Result<VendorRequest, LlmError> {
        let vendor = self.vendor();
        let tools = self
            .tools
            .convert(&options.tools)
            .map_err(|e| e.with_model(&model.model_id))?;
        let shadows_json_tool = tools
            .iter()
            .any(|tool| matches!(tool, AnthropicTool::Custom(custom) if custom.name == JSON_TOOL_NAME));
        if options.wants_json() && shadows_json_tool {
            return Err(
                LlmError::schema(vendor, JSON_TOOL_NAME, "tool name is reserved for structured output")
                    .with_model(&model.model_id),
            );
        }
        let wire = build_request(&model.model_id, messages, options, tools, self.default_max_tokens);

        let base = base_url(vendor, model, DEFAULT_BASE_URL)?;
        let url = endpoint(vendor, model, &base, &["messages"])?;

        let mut headers = json_headers();
        headers.insert("x-api-key", secret_header(vendor, model, api_key.expose_secret())?);
        let version = HeaderValue::from_str(&self.version)
            .map_err(|e| invalid_request(vendor, model, format!("invalid anthropic-version: {e}")))?;
        headers.insert("anthropic-version", version);

        tracing::debug!(
            vendor = %vendor,
            model = %model.model_id,
            messages = wire.messages.len(),
            tools = wire.tools.len(),
            json_tool = wire.tool_choice.is_some(),
            "built messages request"
        );

        Ok(VendorRequest {
            url,
            method: Method::POST,
            headers,
            body: to_body(vendor, model, &wire)?,
        })
    }

    fn response_normalizer(&self, options: &CompletionOptions) -> Box<dyn ResponseNormalizer> {
        Box::new(AnthropicNormalizer::new(options.wants_json()))
    }
}
