//! Provider adapters, one per vendor wire protocol

pub mod anthropic;
pub mod google;
pub mod openai;
pub mod openai_responses;

use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use url::Url;

use crate::convert::ResponseNormalizer;
use crate::error::LlmError;
use crate::stream::{Framing, StreamReassembler};
use crate::types::{CompletionOptions, CompletionResult, FinishReason, Message, ModelDescriptor, Vendor, VendorRequest};

pub use anthropic::AnthropicAdapter;
pub use google::GoogleAdapter;
pub use openai::OpenAiChatAdapter;
pub use openai_responses::OpenAiResponsesAdapter;

/// Header Azure `OpenAI` deployments read the key from
const AZURE_API_KEY: HeaderName = HeaderName::from_static("api-key");

/// Host suffixes of Azure-hosted `OpenAI` endpoints
const AZURE_HOST_SUFFIXES: &[&str] = &[
    ".openai.azure.com",
    ".cognitiveservices.azure.com",
    ".services.ai.azure.com",
];

/// Trait implemented by each vendor adapter
///
/// Adapters hold only construction-time settings and are shared across
/// requests. Per-request state lives in the normalizer and reassembler they
/// hand out.
pub trait ProviderAdapter: Send + Sync + std::fmt::Debug {
    /// Wire protocol this adapter speaks
    fn vendor(&self) -> Vendor;

    /// Stream framing used for a streaming request
    fn framing(&self, _options: &CompletionOptions) -> Framing {
        Framing::ServerSentEvents
    }

    /// Build the vendor HTTP request for one conversational turn
    fn create_completion_request(
        &self,
        model: &ModelDescriptor,
        messages: &[Message],
        api_key: &SecretString,
        options: &CompletionOptions,
    ) -> Result<VendorRequest, LlmError>;

    /// Fresh normalizer for one request
    fn response_normalizer(&self, options: &CompletionOptions) -> Box<dyn ResponseNormalizer>;

    /// Normalize a complete, non-streaming response body
    ///
    /// A body without a finish signal is completed with `stop`, like the end
    /// of a stream.
    fn process_response_buffer(
        &self,
        model: &ModelDescriptor,
        options: &CompletionOptions,
        body: &[u8],
    ) -> Result<CompletionResult, LlmError> {
        let parse_error = |message: String| LlmError::Parse {
            vendor: self.vendor(),
            model: model.model_id.clone(),
            message,
        };

        let text = std::str::from_utf8(body).map_err(|e| parse_error(e.to_string()))?;
        let mut normalizer = self.response_normalizer(options);
        let mut result = normalizer.normalize(text).map_err(|e| {
            tracing::warn!(vendor = %self.vendor(), model = %model.model_id, error = %e, "malformed response body");
            parse_error(e.to_string())
        })?;

        result.append(normalizer.flush());
        if !result.complete {
            result.append(CompletionResult::finished(FinishReason::Stop));
        }
        Ok(result)
    }

    /// Reassembler for one streaming request
    fn stream_reassembler(&self, model: &ModelDescriptor, options: &CompletionOptions) -> StreamReassembler {
        StreamReassembler::new(
            self.vendor(),
            model.model_id.clone(),
            self.framing(options),
            self.response_normalizer(options),
        )
    }
}

/// Whether the URL points at an Azure-hosted `OpenAI` deployment
pub fn is_azure_host(url: &Url) -> bool {
    url.host_str().is_some_and(|host| {
        let host = host.to_ascii_lowercase();
        AZURE_HOST_SUFFIXES.iter().any(|suffix| host.ends_with(suffix))
    })
}

/// Swap bearer authorization for Azure's `api-key` header
///
/// Returns whether the swap happened; non-Azure hosts are left untouched.
pub fn apply_azure_auth(url: &Url, headers: &mut HeaderMap, api_key: HeaderValue) -> bool {
    if !is_azure_host(url) {
        return false;
    }
    headers.remove(AUTHORIZATION);
    headers.insert(AZURE_API_KEY, api_key);
    true
}

/// Base URL for a model: its override, or the vendor default
fn base_url(vendor: Vendor, model: &ModelDescriptor, default: &str) -> Result<Url, LlmError> {
    match &model.url {
        Some(url) => Ok(url.clone()),
        None => Url::parse(default).map_err(|e| invalid_request(vendor, model, format!("invalid base URL: {e}"))),
    }
}

/// Append path segments to a base URL, keeping its query string
fn endpoint(vendor: Vendor, model: &ModelDescriptor, base: &Url, segments: &[&str]) -> Result<Url, LlmError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| invalid_request(vendor, model, format!("base URL cannot take a path: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Headers every vendor request carries
fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

/// Header value holding a credential, flagged sensitive
fn secret_header(vendor: Vendor, model: &ModelDescriptor, value: &str) -> Result<HeaderValue, LlmError> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|e| invalid_request(vendor, model, format!("API key is not a valid header value: {e}")))?;
    header.set_sensitive(true);
    Ok(header)
}

/// Bearer authorization, or `api-key` for Azure hosts
fn openai_auth(
    vendor: Vendor,
    model: &ModelDescriptor,
    url: &Url,
    headers: &mut HeaderMap,
    api_key: &SecretString,
) -> Result<(), LlmError> {
    let key = api_key.expose_secret();
    headers.insert(AUTHORIZATION, secret_header(vendor, model, &format!("Bearer {key}"))?);
    if apply_azure_auth(url, headers, secret_header(vendor, model, key)?) {
        tracing::debug!(vendor = %vendor, model = %model.model_id, "using Azure api-key authentication");
    }
    Ok(())
}

/// Serialize a wire body
fn to_body<T: Serialize>(vendor: Vendor, model: &ModelDescriptor, body: &T) -> Result<serde_json::Value, LlmError> {
    serde_json::to_value(body).map_err(|e| invalid_request(vendor, model, format!("failed to serialize body: {e}")))
}

fn invalid_request(vendor: Vendor, model: &ModelDescriptor, reason: String) -> LlmError {
    LlmError::InvalidRequest {
        vendor,
        model: model.model_id.clone(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_bearer() -> HeaderMap {
        let mut headers = json_headers();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer sk-test"));
        headers
    }

    #[test]
    fn azure_hosts_are_detected() {
        for host in [
            "https://contoso.openai.azure.com/openai/v1",
            "https://contoso.cognitiveservices.azure.com/",
            "https://contoso.services.ai.azure.com/models",
            "https://CONTOSO.OPENAI.AZURE.COM/",
        ] {
            assert!(is_azure_host(&Url::parse(host).unwrap()), "{host}");
        }
        for host in [
            "https://api.openai.com/v1",
            "https://openai.azure.com.example.org/",
            "http://localhost:8080/v1",
        ] {
            assert!(!is_azure_host(&Url::parse(host).unwrap()), "{host}");
        }
    }

    #[test]
    fn azure_auth_replaces_bearer() {
        let url = Url::parse("https://contoso.openai.azure.com/openai/v1?api-version=preview").unwrap();
        let mut headers = headers_with_bearer();

        assert!(apply_azure_auth(&url, &mut headers, HeaderValue::from_static("sk-test")));
        assert!(headers.get(AUTHORIZATION).is_none());
        assert_eq!(headers.get("api-key").unwrap(), "sk-test");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn non_azure_auth_is_untouched() {
        let url = Url::parse("https://api.openai.com/v1").unwrap();
        let mut headers = headers_with_bearer();

        assert!(!apply_azure_auth(&url, &mut headers, HeaderValue::from_static("sk-test")));
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer sk-test");
        assert!(headers.get("api-key").is_none());
    }

    #[test]
    fn endpoint_keeps_query_string() {
        let model = ModelDescriptor::new("azure", "gpt-4o");
        let base = Url::parse("https://contoso.openai.azure.com/openai/v1/?api-version=preview").unwrap();

        let url = endpoint(Vendor::OpenAiChat, &model, &base, &["chat", "completions"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://contoso.openai.azure.com/openai/v1/chat/completions?api-version=preview"
        );
    }

    #[test]
    fn endpoint_rejects_opaque_base() {
        let model = ModelDescriptor::new("openai", "gpt-4o");
        let base = Url::parse("mailto:ops@example.com").unwrap();

        let err = endpoint(Vendor::OpenAiChat, &model, &base, &["responses"]).unwrap_err();
        assert!(matches!(err, LlmError::InvalidRequest { .. }));
    }
}
