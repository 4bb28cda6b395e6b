//! `OpenAI` Responses API adapter

use http::Method;
use secrecy::SecretString;

use super::openai::DEFAULT_BASE_URL;
use super::{ProviderAdapter, base_url, endpoint, json_headers, openai_auth, to_body};
use crate::convert::ResponseNormalizer;
use crate::convert::openai_responses::{OpenAiResponsesNormalizer, build_request};
use crate::error::LlmError;
use crate::tools::{OpenAiResponsesToolConverter, ToolSchemaConverter};
use crate::types::{CompletionOptions, Message, ModelDescriptor, Vendor, VendorRequest};

/// Responses API adapter
///
/// Function tools are sent in strict mode.
#[derive(Debug, Clone, Copy)]
pub struct OpenAiResponsesAdapter {
    tools: OpenAiResponsesToolConverter,
    /// Whether `OpenAI` may keep the response for later retrieval
    store: bool,
}

impl OpenAiResponsesAdapter {
    pub const fn new(store: bool) -> Self {
        Self {
            tools: OpenAiResponsesToolConverter::new(true),
            store,
        }
    }
}

impl Default for OpenAiResponsesAdapter {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ProviderAdapter for OpenAiResponsesAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::OpenAiResponses
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
        let wire = build_request(&model.model_id, messages, options, tools, self.store);

        let base = base_url(vendor, model, DEFAULT_BASE_URL)?;
        let url = endpoint(vendor, model, &base, &["responses"])?;
        let mut headers = json_headers();
        openai_auth(vendor, model, &url, &mut headers, api_key)?;

        tracing::debug!(
            vendor = %vendor,
            model = %model.model_id,
            input_items = wire.input.len(),
            tools = wire.tools.len(),
            stream = wire.stream,
            "built responses request"
        );

        Ok(VendorRequest {
            url,
            method: Method::POST,
            headers,
            body: to_body(vendor, model, &wire)?,
        })
    }

    fn response_normalizer(&self, _options: &CompletionOptions) -> Box<dyn ResponseNormalizer> {
        Box::new(OpenAiResponsesNormalizer::new())
    }
}
