//! Multi-vendor LLM adapter layer for Prism
//!
//! Translates one canonical chat-completion model into the wire formats of
//! the `OpenAI` Chat Completions, `OpenAI` Responses, Anthropic Messages and
//! Google Generative Language APIs, and normalizes their bodies and streams
//! back into canonical results. Callers resolve an adapter through the
//! [`AdapterRegistry`] and bring their own HTTP stack, or use
//! [`HttpTransport`] behind the `http` feature.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod convert;
pub mod error;
pub mod protocol;
pub mod provider;
pub mod registry;
pub mod stream;
pub mod tools;
#[cfg(feature = "http")]
pub mod transport;
pub mod types;

pub use convert::ResponseNormalizer;
pub use error::LlmError;
pub use provider::ProviderAdapter;
pub use registry::AdapterRegistry;
pub use stream::{Framing, StreamReassembler};
pub use tools::ToolSchemaConverter;
#[cfg(feature = "http")]
pub use transport::{CompletionStream, HttpTransport};
pub use types::{
    CompletionOptions, CompletionRequest, CompletionResult, FinishReason, GenericTool, InlineImage, Message,
    ModelDescriptor, Role, ToolCall, Usage, Vendor, VendorRequest,
};
