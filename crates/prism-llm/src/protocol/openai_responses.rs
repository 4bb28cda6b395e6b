//! `OpenAI` Responses API wire format types

use serde::{Deserialize, Serialize};

// -- Request types --

/// `POST /responses` request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsesRequest {
    /// Model identifier
    pub model: String,
    /// System instructions (top-level, not in `input`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Conversation items
    pub input: Vec<ResponsesInputItem>,
    /// Tool definitions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ResponsesTool>,
    /// Text output configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<ResponsesTextConfig>,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Whether the vendor keeps the response server-side
    pub store: bool,
    /// Whether to stream the response
    pub stream: bool,
}

/// Item of the `input` array
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsesInputItem {
    /// Conversational message
    Message {
        /// Role ("user", "assistant")
        role: String,
        /// Content parts
        content: Vec<ResponsesInputContent>,
    },
    /// Function call previously made by the assistant
    FunctionCall {
        /// Call identifier
        call_id: String,
        /// Function name
        name: String,
        /// JSON-encoded arguments
        arguments: String,
    },
    /// Result of a function call
    FunctionCallOutput {
        /// Call identifier this result answers
        call_id: String,
        /// Result text
        output: String,
    },
}

/// Content part of an input message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsesInputContent {
    /// User-supplied text
    InputText {
        /// The text string
        text: String,
    },
    /// User-supplied image
    InputImage {
        /// Image URL or base64 data URI
        image_url: String,
    },
    /// Text of an earlier assistant turn
    OutputText {
        /// The text string
        text: String,
        /// Citations (`url_citation`, `file_citation`, ...)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        annotations: Option<Vec<serde_json::Value>>,
    },
}

/// Responses tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsesTool {
    /// Client-side function
    Function {
        /// Function name
        name: String,
        /// Human-readable description
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        /// JSON Schema for parameters
        parameters: serde_json::Value,
        /// Whether arguments must match the schema exactly
        strict: bool,
    },
    /// Vendor-hosted web search
    WebSearchPreview,
}

/// `text` request field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsesTextConfig {
    /// Output format
    pub format: ResponsesTextFormat,
}

/// Structured output format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsesTextFormat {
    /// Any valid JSON object
    JsonObject,
    /// JSON matching a schema
    JsonSchema {
        /// Schema name
        name: String,
        /// JSON Schema
        schema: serde_json::Value,
        /// Whether the vendor enforces the schema exactly
        strict: bool,
    },
}

// -- Response types --

/// Non-streaming body or the `response` object of lifecycle events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponsesBody {
    /// Lifecycle status ("completed", "incomplete", "failed", "in_progress")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Output items in generation order
    #[serde(default)]
    pub output: Vec<ResponsesOutputItem>,
    /// Why the response is incomplete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incomplete_details: Option<ResponsesIncompleteDetails>,
    /// Error for failed responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponsesErrorDetail>,
    /// Token usage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<ResponsesUsage>,
}

/// Output item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsesOutputItem {
    /// Assistant message
    Message {
        /// Content parts
        #[serde(default)]
        content: Vec<ResponsesOutputContent>,
    },
    /// Reasoning with optional summaries
    Reasoning {
        /// Summary parts
        #[serde(default)]
        summary: Vec<ResponsesSummaryText>,
    },
    /// Function call requested by the model
    FunctionCall {
        /// Call identifier
        #[serde(default)]
        call_id: Option<String>,
        /// Function name
        name: String,
        /// JSON-encoded arguments
        #[serde(default)]
        arguments: String,
    },
    /// Hosted image generation
    ImageGenerationCall {
        /// Base64 image data once generated
        #[serde(default)]
        result: Option<String>,
        /// Image format ("png", "webp", "jpeg")
        #[serde(default)]
        output_format: Option<String>,
    },
    /// Hosted web search, kept whole for grounding metadata
    WebSearchCall(serde_json::Map<String, serde_json::Value>),
    /// Items without a canonical counterpart (file search, code interpreter, etc.)
    #[serde(other)]
    Other,
}

/// Content part of an output message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsesOutputContent {
    /// Generated text
    OutputText {
        /// The text string
        text: String,
        /// Citations (`url_citation`, `file_citation`, ...)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        annotations: Option<Vec<serde_json::Value>>,
    },
    /// Refusal text
    Refusal {
        /// The refusal string
        refusal: String,
    },
    /// Anything else
    #[serde(other)]
    Other,
}

/// Reasoning summary part
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsesSummaryText {
    /// Summary text
    #[serde(default)]
    pub text: String,
}

/// Reason attached to an incomplete response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsesIncompleteDetails {
    /// "`max_output_tokens`" or "`content_filter`"
    #[serde(default)]
    pub reason: Option<String>,
}

/// Error attached to a failed response or an `error` event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsesErrorDetail {
    /// Error code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Error message
    #[serde(default)]
    pub message: String,
}

/// Token usage
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ResponsesUsage {
    /// Prompt tokens
    #[serde(default)]
    pub input_tokens: u32,
    /// Generated tokens
    #[serde(default)]
    pub output_tokens: u32,
}

// -- Streaming types --

/// Server-sent event, tagged by its `type` field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResponsesStreamEvent {
    /// Visible text fragment
    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta {
        /// Text fragment
        delta: String,
    },
    /// Reasoning summary fragment
    #[serde(rename = "response.reasoning_summary_text.delta")]
    ReasoningSummaryDelta {
        /// Text fragment
        delta: String,
    },
    /// Raw reasoning fragment
    #[serde(rename = "response.reasoning_text.delta")]
    ReasoningTextDelta {
        /// Text fragment
        delta: String,
    },
    /// An output item is finished
    #[serde(rename = "response.output_item.done")]
    OutputItemDone {
        /// The finished item
        item: ResponsesOutputItem,
    },
    /// Response finished normally
    #[serde(rename = "response.completed")]
    Completed {
        /// Final response state
        response: ResponsesBody,
    },
    /// Response stopped early
    #[serde(rename = "response.incomplete")]
    Incomplete {
        /// Final response state
        response: ResponsesBody,
    },
    /// Response failed
    #[serde(rename = "response.failed")]
    Failed {
        /// Final response state
        response: ResponsesBody,
    },
    /// Stream-level error
    #[serde(rename = "error")]
    Error {
        /// Error code
        #[serde(default)]
        code: Option<String>,
        /// Error message
        #[serde(default)]
        message: String,
    },
    /// Lifecycle and delta events that carry nothing canonical (including
    /// `response.image_generation_call.partial_image`)
    #[serde(other)]
    Other,
}

/// Any payload the Responses API sends: a stream event or a full body
#[derive(Debug, Clone)]
pub enum ResponsesPayload {
    /// Streaming event (has a `type` field)
    Event(ResponsesStreamEvent),
    /// Non-streaming response object
    Body(ResponsesBody),
}

impl ResponsesPayload {
    /// Decode a payload, choosing the shape by the presence of `type`
    ///
    /// Events are decoded strictly; a malformed event is an error rather than
    /// an empty body.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        if value.get("type").is_some() {
            serde_json::from_value(value).map(Self::Event)
        } else {
            serde_json::from_value(value).map(Self::Body)
        }
    }
}
