//! Mock vendor backend for integration tests
//!
//! Serves the four vendor endpoints with canned bodies. Streaming bodies are
//! written in small fixed-size chunks so events straddle network reads.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use futures_util::stream;
use tokio_util::sync::CancellationToken;

use super::fixtures;

/// Bytes per chunk when streaming a body
const CHUNK_SIZE: usize = 7;

/// Mock vendor backend returning predictable responses
pub struct MockVendor {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockVendorState>,
}

/// Request as the mock received it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

struct MockVendorState {
    request_count: AtomicU32,
    /// Number of requests to fail before succeeding (0 = never fail)
    fail_count: AtomicU32,
    last_request: Mutex<Option<RecordedRequest>>,
}

impl MockVendor {
    /// Start the mock server, returning immediately
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(0).await
    }

    /// Start a mock server that fails the first `n` requests with 500
    pub async fn start_failing(n: u32) -> anyhow::Result<Self> {
        Self::start_inner(n).await
    }

    async fn start_inner(fail_count: u32) -> anyhow::Result<Self> {
        let state = Arc::new(MockVendorState {
            request_count: AtomicU32::new(0),
            fail_count: AtomicU32::new(fail_count),
            last_request: Mutex::new(None),
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat_completions))
            .route("/v1/responses", routing::post(handle_responses))
            .route("/v1/messages", routing::post(handle_messages))
            .route("/v1beta/models/{target}", routing::post(handle_generate_content))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for the `OpenAI` and Anthropic adapters
    pub fn base_url(&self) -> url::Url {
        self.url("/v1")
    }

    /// Base URL for the Google adapter
    pub fn google_base_url(&self) -> url::Url {
        self.url("/v1beta")
    }

    fn url(&self, path: &str) -> url::Url {
        url::Url::parse(&format!("http://{}{path}", self.addr)).expect("mock address is a valid URL")
    }

    /// Number of requests received, failed ones included
    pub fn request_count(&self) -> u32 {
        self.state.request_count.load(Ordering::Relaxed)
    }

    /// Most recent request
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.state.last_request.lock().expect("lock not poisoned").clone()
    }
}

impl Drop for MockVendor {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl MockVendorState {
    /// Record the request, returning a 500 response while failures remain
    fn record(&self, path: String, headers: HeaderMap, body: serde_json::Value) -> Option<Response> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().expect("lock not poisoned") = Some(RecordedRequest { path, headers, body });

        let remaining = self.fail_count.load(Ordering::Relaxed);
        if remaining == 0 {
            return None;
        }
        self.fail_count.fetch_sub(1, Ordering::Relaxed);

        Some(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": {
                        "message": "mock server intentional failure",
                        "type": "server_error"
                    }
                })),
            )
                .into_response(),
        )
    }
}

fn wants_stream(body: &serde_json::Value) -> bool {
    body.get("stream").and_then(serde_json::Value::as_bool).unwrap_or(false)
}

// -- Handlers --

async fn handle_chat_completions(
    State(state): State<Arc<MockVendorState>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let stream = wants_stream(&body);
    if let Some(failure) = state.record("/v1/chat/completions".to_owned(), headers, body) {
        return failure;
    }

    if stream {
        chunked_event_stream(fixtures::OPENAI_CHAT_STREAM)
    } else {
        Json(fixtures::openai_chat_body()).into_response()
    }
}

async fn handle_responses(
    State(state): State<Arc<MockVendorState>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let stream = wants_stream(&body);
    if let Some(failure) = state.record("/v1/responses".to_owned(), headers, body) {
        return failure;
    }

    if stream {
        chunked_event_stream(fixtures::OPENAI_RESPONSES_STREAM)
    } else {
        Json(fixtures::openai_responses_body()).into_response()
    }
}

async fn handle_messages(
    State(state): State<Arc<MockVendorState>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let stream = wants_stream(&body);
    if let Some(failure) = state.record("/v1/messages".to_owned(), headers, body) {
        return failure;
    }

    if stream {
        chunked_event_stream(fixtures::ANTHROPIC_STREAM)
    } else {
        Json(fixtures::anthropic_body()).into_response()
    }
}

async fn handle_generate_content(
    State(state): State<Arc<MockVendorState>>,
    Path(target): Path<String>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let stream = target.ends_with(":streamGenerateContent");
    if let Some(failure) = state.record(format!("/v1beta/models/{target}"), headers, body) {
        return failure;
    }

    if stream {
        chunked_event_stream(fixtures::GOOGLE_STREAM)
    } else {
        Json(fixtures::google_body()).into_response()
    }
}

/// Stream a canned SSE body a few bytes at a time
fn chunked_event_stream(body: &'static str) -> Response {
    let chunks = body
        .as_bytes()
        .chunks(CHUNK_SIZE)
        .map(|chunk| Ok::<_, std::convert::Infallible>(chunk.to_vec()));

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(stream::iter(chunks)),
    )
        .into_response()
}
