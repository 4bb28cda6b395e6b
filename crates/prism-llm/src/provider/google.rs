//! Google Generative Language API adapter

use http::Method;
use secrecy::{ExposeSecret, SecretString};

use super::{ProviderAdapter, base_url, endpoint, json_headers, secret_header, to_body};
use crate::convert::ResponseNormalizer;
use crate::convert::google::{GoogleNormalizer, build_request};
use crate::error::LlmError;
use crate::tools::{GoogleToolConverter, ToolSchemaConverter, into_wire_tools};
use crate::types::{CompletionOptions, Message, ModelDescriptor, Vendor, VendorRequest};

/// Default Google Generative Language API base URL
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// `generateContent` adapter
///
/// Streaming requests go to `streamGenerateContent` with `alt=sse`, so both
/// paths share the SSE reassembler.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleAdapter {
    tools: GoogleToolConverter,
}

impl GoogleAdapter {
    pub const fn new() -> Self {
        Self {
            tools: GoogleToolConverter,
        }
    }
}

impl ProviderAdapter for GoogleAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::Google
    }

    fn create_completion_request(
        &self,
        model: &ModelDescriptor,
        messages: &[Message],
        api_key: &SecretString,
        options: &CompletionOptions,
    ) -> Result<VendorRequest, LlmError> {
        let vendor = self.vendor();
        let entries = self
            .tools
            .convert(&options.tools)
            .map_err(|e| e.with_model(&model.model_id))?;
        let wire = build_request(messages, options, into_wire_tools(entries));

        let base = base_url(vendor, model, DEFAULT_BASE_URL)?;
        let method = if options.stream {
            "streamGenerateContent"
        } else {
            "generateContent"
        };
        let target = format!("{}:{method}", model.model_id);
        let mut url = endpoint(vendor, model, &base, &["models", target.as_str()])?;
        if options.stream {
            url.query_pairs_mut().append_pair("alt", "sse");
        }

        let mut headers = json_headers();
        headers.insert("x-goog-api-key", secret_header(vendor, model, api_key.expose_secret())?);

        tracing::debug!(
            vendor = %vendor,
            model = %model.model_id,
            contents = wire.contents.len(),
            tools = wire.tools.len(),
            stream = options.stream,
            "built generateContent request"
        );

        Ok(VendorRequest {
            url,
            method: Method::POST,
            headers,
            body: to_body(vendor, model, &wire)?,
        })
    }

    fn response_normalizer(&self, _options: &CompletionOptions) -> Box<dyn ResponseNormalizer> {
        Box::new(GoogleNormalizer::new())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::tools::tests::search_tool;
    use crate::types::GenericTool;

    fn model() -> ModelDescriptor {
        ModelDescriptor::new("google", "gemini-2.5-flash")
    }

    #[test]
    fn streaming_uses_sse_endpoint() {
        let adapter = GoogleAdapter::new();
        let options = CompletionOptions {
            stream: true,
            ..CompletionOptions::default()
        };
        let request = adapter
            .create_completion_request(&model(), &[Message::user("hi")], &SecretString::from("g-key"), &options)
            .unwrap();

        assert_eq!(
            request.url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
        );
        assert_eq!(request.headers.get("x-goog-api-key").unwrap(), "g-key");
        assert!(request.body.get("model").is_none());
    }

    #[test]
    fn tools_are_grouped() {
        let adapter = GoogleAdapter::new();
        let options = CompletionOptions {
            tools: vec![
                GenericTool::function(
                    "lookup",
                    "Look something up",
                    json!({"type": "object", "additionalProperties": false, "properties": {}}),
                ),
                search_tool("google_search", None, true),
            ],
            ..CompletionOptions::default()
        };
        let request = adapter
            .create_completion_request(&model(), &[Message::user("hi")], &SecretString::from("g-key"), &options)
            .unwrap();

        assert_eq!(
            request.url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(
            request.body["tools"],
            json!([
                {"functionDeclarations": [{"name": "lookup", "description": "Look something up", "parameters": {"type": "object", "properties": {}}}]},
                {"google_search": {}}
            ])
        );
    }
}
