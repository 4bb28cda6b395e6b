//! HTTP execution of vendor requests

use std::pin::Pin;

use futures_util::{Stream, StreamExt, stream};
use reqwest::Client;

use crate::error::LlmError;
use crate::provider::ProviderAdapter;
use crate::stream::StreamReassembler;
use crate::types::{CompletionOptions, CompletionResult, ModelDescriptor, VendorRequest};

/// Stream of canonical deltas for one request
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<CompletionResult, LlmError>> + Send>>;

/// Sends [`VendorRequest`]s with `reqwest`
///
/// Failures are reported, never retried.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (timeouts, proxies)
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Send a non-streaming request and normalize the body
    pub async fn complete(
        &self,
        adapter: &dyn ProviderAdapter,
        model: &ModelDescriptor,
        options: &CompletionOptions,
        request: &VendorRequest,
    ) -> Result<CompletionResult, LlmError> {
        let response = self.send(adapter, model, request).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(adapter, model, None, e.to_string()))?;

        adapter.process_response_buffer(model, options, &body)
    }

    /// Send a streaming request
    ///
    /// The returned stream yields one delta per network read that completed
    /// at least one event, and ends after the completing delta.
    pub async fn stream(
        &self,
        adapter: &dyn ProviderAdapter,
        model: &ModelDescriptor,
        options: &CompletionOptions,
        request: &VendorRequest,
    ) -> Result<CompletionStream, LlmError> {
        let response = self.send(adapter, model, request).await?;

        let state = StreamState {
            body: Box::pin(response.bytes_stream()),
            reassembler: adapter.stream_reassembler(model, options),
            done: false,
        };

        let deltas = stream::unfold(state, |mut state| async move {
            let item = state.next_delta().await?;
            Some((item, state))
        });

        Ok(Box::pin(deltas))
    }

    async fn send(
        &self,
        adapter: &dyn ProviderAdapter,
        model: &ModelDescriptor,
        request: &VendorRequest,
    ) -> Result<reqwest::Response, LlmError> {
        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .json(&request.body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(vendor = %adapter.vendor(), model = %model.model_id, error = %e, "upstream request failed");
                transport_error(adapter, model, None, e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                vendor = %adapter.vendor(),
                model = %model.model_id,
                status = %status,
                "upstream returned error"
            );
            return Err(transport_error(adapter, model, Some(status), body));
        }

        Ok(response)
    }
}

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<bytes::Bytes>> + Send>>;

struct StreamState {
    body: ByteStream,
    reassembler: StreamReassembler,
    done: bool,
}

impl StreamState {
    /// Next non-empty delta, `None` once the stream is over
    async fn next_delta(&mut self) -> Option<Result<CompletionResult, LlmError>> {
        while !self.done {
            match self.body.next().await {
                Some(Ok(chunk)) => {
                    let delta = self.reassembler.push(&chunk);
                    self.done = self.reassembler.is_closed();
                    if !delta.is_empty() {
                        return Some(Ok(delta));
                    }
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(LlmError::Transport {
                        vendor: self.reassembler.vendor(),
                        model: self.reassembler.model().to_owned(),
                        status: None,
                        body: e.to_string(),
                    }));
                }
                None => {
                    self.done = true;
                    let delta = self.reassembler.finish();
                    return (!delta.is_empty()).then_some(Ok(delta));
                }
            }
        }
        None
    }
}

fn transport_error(
    adapter: &dyn ProviderAdapter,
    model: &ModelDescriptor,
    status: Option<http::StatusCode>,
    body: String,
) -> LlmError {
    LlmError::Transport {
        vendor: adapter.vendor(),
        model: model.model_id.clone(),
        status,
        body,
    }
}
