use http::header::{AUTHORIZATION, HeaderMap};
use http::Method;
use serde::{Deserialize, Serialize};
use url::Url;

use super::message::Message;
use super::tool::GenericTool;

/// Requested output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// A single JSON document
    Json,
}

/// Generation options shared by every vendor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionOptions {
    /// Tools the model may call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<GenericTool>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Structured output mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    /// JSON Schema the output must satisfy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
    /// Whether to stream the response
    #[serde(default)]
    pub stream: bool,
}

impl CompletionOptions {
    /// Whether the caller asked for JSON output, with or without a schema
    pub fn wants_json(&self) -> bool {
        self.response_format == Some(ResponseFormat::Json) || self.response_schema.is_some()
    }
}

/// Canonical completion request for one conversational turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,
    /// Conversation messages
    pub messages: Vec<Message>,
    /// Generation options
    #[serde(flatten)]
    pub options: CompletionOptions,
}

/// Model as described by the model registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Vendor-side model identifier
    pub model_id: String,
    /// Base URL override; the vendor default is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,
    /// Provider key the model is served by
    pub provider: String,
}

impl ModelDescriptor {
    pub fn new(provider: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            url: None,
            provider: provider.into(),
        }
    }

    /// Override the base URL
    #[must_use]
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }
}

/// Fully built HTTP request for a vendor endpoint
#[derive(Debug, Clone)]
pub struct VendorRequest {
    /// Endpoint URL
    pub url: Url,
    /// HTTP method
    pub method: Method,
    /// Request headers, credentials included
    pub headers: HeaderMap,
    /// JSON body
    pub body: serde_json::Value,
}

/// Headers that carry credentials and must not be printed
const CREDENTIAL_HEADERS: &[&str] = &["api-key", "x-api-key", "x-goog-api-key"];

impl VendorRequest {
    /// JSON rendering with credential headers masked, for logs and the CLI
    pub fn to_redacted_json(&self) -> serde_json::Value {
        let headers: serde_json::Map<String, serde_json::Value> = self
            .headers
            .iter()
            .map(|(name, value)| {
                let shown = if *name == AUTHORIZATION || CREDENTIAL_HEADERS.contains(&name.as_str()) {
                    "<redacted>".to_owned()
                } else {
                    value.to_str().unwrap_or("<binary>").to_owned()
                };
                (name.as_str().to_owned(), serde_json::Value::String(shown))
            })
            .collect();

        serde_json::json!({
            "method": self.method.as_str(),
            "url": self.url.as_str(),
            "headers": headers,
            "body": self.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    #[test]
    fn options_flatten_into_request() {
        let request: CompletionRequest = serde_json::from_value(serde_json::json!({
            "model": "gpt-4o",
            "messages": [{"role": "user", "content": "hi"}],
            "max_tokens": 256,
            "response_format": "json",
            "stream": true
        }))
        .unwrap();

        assert_eq!(request.options.max_tokens, Some(256));
        assert!(request.options.wants_json());
        assert!(request.options.stream);
        assert!(request.options.tools.is_empty());
    }

    #[test]
    fn schema_alone_requests_json() {
        let options = CompletionOptions {
            response_schema: Some(serde_json::json!({"type": "object"})),
            ..CompletionOptions::default()
        };
        assert!(options.wants_json());
        assert!(!CompletionOptions::default().wants_json());
    }

    #[test]
    fn redaction_masks_credentials() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("sk-secret"));
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));

        let request = VendorRequest {
            url: Url::parse("https://api.anthropic.com/v1/messages").unwrap(),
            method: Method::POST,
            headers,
            body: serde_json::json!({}),
        };

        let rendered = request.to_redacted_json();
        assert_eq!(rendered["headers"]["x-api-key"], "<redacted>");
        assert_eq!(rendered["headers"]["anthropic-version"], "2023-06-01");
        assert_eq!(rendered["method"], "POST");
    }
}
