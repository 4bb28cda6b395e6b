//! `OpenAI` Chat Completions adapter, also used for compatible servers

use http::Method;
use secrecy::SecretString;

use super::{ProviderAdapter, base_url, endpoint, json_headers, openai_auth, to_body};
use crate::convert::ResponseNormalizer;
use crate::convert::openai::{OpenAiChatNormalizer, build_request};
use crate::error::LlmError;
use crate::tools::{OpenAiChatToolConverter, ToolSchemaConverter};
use crate::types::{CompletionOptions, Message, ModelDescriptor, Vendor, VendorRequest};

/// Default `OpenAI` API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat Completions adapter
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiChatAdapter {
    tools: OpenAiChatToolConverter,
}

impl OpenAiChatAdapter {
    pub const fn new() -> Self {
        Self {
            tools: OpenAiChatToolConverter,
        }
    }
}

impl ProviderAdapter for OpenAiChatAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::OpenAiChat
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
        let wire = build_request(&model.model_id, messages, options, tools);

        let base = base_url(vendor, model, DEFAULT_BASE_URL)?;
        let url = endpoint(vendor, model, &base, &["chat", "completions"])?;
        let mut headers = json_headers();
        openai_auth(vendor, model, &url, &mut headers, api_key)?;

        tracing::debug!(
            vendor = %vendor,
            model = %model.model_id,
            messages = wire.messages.len(),
            tools = wire.tools.len(),
            stream = wire.stream,
            "built chat completion request"
        );

        Ok(VendorRequest {
            url,
            method: Method::POST,
            headers,
            body: to_body(vendor, model, &wire)?,
        })
    }

    fn response_normalizer(&self, _options: &CompletionOptions) -> Box<dyn ResponseNormalizer> {
        Box::new(OpenAiChatNormalizer::new())
    }
}
