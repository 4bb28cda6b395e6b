//! Conversion between canonical types and Google Generative Language format

use serde_json::{Value, json};

use super::{ResponseNormalizer, system_text};
use crate::protocol::google::{
    GoogleContent, GoogleFunctionCall, GoogleFunctionResponse, GoogleGenerationConfig, GoogleInlineData, GooglePart,
    GoogleRequest, GoogleResponse, GoogleTool,
};
use crate::tools::schema;
use crate::types::{CompletionOptions, CompletionResult, FinishReason, InlineImage, Message, Role, ToolCall, Usage};

// -- Outbound: canonical request -> Google wire format --

/// Build a `generateContent` request body
///
/// The model id travels in the URL, not the body. The response schema is
/// sent without `additionalProperties`, which Google rejects.
pub fn build_request(messages: &[Message], options: &CompletionOptions, tools: Vec<GoogleTool>) -> GoogleRequest {
    let system_instruction = system_text(messages).map(|text| GoogleContent {
        role: None,
        parts: vec![GooglePart::text(text)],
    });

    let mut contents: Vec<GoogleContent> = Vec::new();
    for msg in messages.iter().filter(|m| m.role != Role::System) {
        let content = message_to_google(msg);
        match contents.last_mut() {
            Some(last) if last.role == content.role => last.parts.extend(content.parts),
            _ => contents.push(content),
        }
    }

    let wants_json = options.wants_json();
    let generation_config = GoogleGenerationConfig {
        temperature: options.temperature,
        max_output_tokens: options.max_tokens,
        response_mime_type: wants_json.then(|| "application/json".to_owned()),
        response_schema: options
            .response_schema
            .as_ref()
            .map(schema::strip_additional_properties),
    };
    let has_config = generation_config.temperature.is_some()
        || generation_config.max_output_tokens.is_some()
        || generation_config.response_mime_type.is_some();

    GoogleRequest {
        contents,
        system_instruction,
        tools,
        generation_config: has_config.then_some(generation_config),
    }
}

fn message_to_google(msg: &Message) -> GoogleContent {
    if msg.role == Role::Tool {
        // Function responses must be objects; wrap anything else
        let response = match serde_json::from_str::<Value>(&msg.content) {
            Ok(value @ Value::Object(_)) => value,
            _ => json!({"content": msg.content}),
        };
        return GoogleContent {
            role: Some("user".to_owned()),
            parts: vec![GooglePart {
                function_response: Some(GoogleFunctionResponse {
                    id: msg.tool_call_id.clone(),
                    name: msg.name.clone().unwrap_or_default(),
                    response,
                }),
                ..GooglePart::default()
            }],
        };
    }

    let mut parts = Vec::new();
    if !msg.content.is_empty() {
        parts.push(GooglePart::text(msg.content.clone()));
    }
    parts.extend(msg.images.iter().map(|image| GooglePart {
        inline_data: Some(GoogleInlineData {
            mime_type: image.mime_type.clone(),
            data: image.data.clone(),
        }),
        ..GooglePart::default()
    }));
    parts.extend(msg.tool_calls.iter().map(|call| GooglePart {
        function_call: Some(GoogleFunctionCall {
            id: call.id.clone(),
            name: call.name.clone(),
            args: if call.arguments.is_object() {
                call.arguments.clone()
            } else {
                json!({})
            },
        }),
        ..GooglePart::default()
    }));
    if parts.is_empty() {
        parts.push(GooglePart::text(String::new()));
    }

    let role = if msg.role == Role::Assistant { "model" } else { "user" };
    GoogleContent {
        role: Some(role.to_owned()),
        parts,
    }
}

// -- Inbound: Google payloads -> canonical result --

/// Map a Google candidate finish reason
pub fn map_finish_reason(reason: &str, saw_function_call: bool) -> FinishReason {
    match reason {
        "STOP" if saw_function_call => FinishReason::ToolCalls,
        "MAX_TOKENS" => FinishReason::Length,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" | "IMAGE_SAFETY" | "LANGUAGE" => {
            FinishReason::ContentFilter
        }
        "MALFORMED_FUNCTION_CALL" => FinishReason::Error,
        // STOP, FINISH_REASON_UNSPECIFIED, OTHER
        _ => FinishReason::Stop,
    }
}

/// Normalizer for `generateContent` bodies and stream events
///
/// Parts flagged `thought` are reasoning: thought text goes to `thinking`,
/// thought images are intermediate drafts and are dropped.
#[derive(Debug, Default)]
pub struct GoogleNormalizer {
    saw_function_call: bool,
}

impl GoogleNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply_part(&mut self, result: &mut CompletionResult, part: GooglePart) {
        let thought = part.is_thought();

        if let Some(text) = part.text.filter(|t| !t.is_empty()) {
            if thought {
                result.thinking.push(text);
            } else {
                result.content.push(text);
            }
        }

        if let Some(data) = part.inline_data {
            if thought {
                tracing::debug!(mime_type = %data.mime_type, "dropping thought image");
            } else {
                result.images.push(InlineImage::new(data.mime_type, data.data));
            }
        }

        if let Some(call) = part.function_call {
            self.saw_function_call = true;
            result.tool_calls.push(ToolCall {
                id: call.id,
                name: call.name,
                arguments: if call.args.is_null() { json!({}) } else { call.args },
            });
        }
    }
}

impl ResponseNormalizer for GoogleNormalizer {
    fn normalize(&mut self, payload: &str) -> Result<CompletionResult, serde_json::Error> {
        let response: GoogleResponse = serde_json::from_str(payload)?;

        if let Some(error) = response.error {
            let message = if error.status.is_empty() {
                error.message
            } else {
                format!("{}: {}", error.status, error.message)
            };
            return Ok(CompletionResult::failed(message));
        }

        let mut result = CompletionResult::default();

        if let Some(usage) = response.usage_metadata {
            result.usage = Some(Usage {
                prompt_tokens: usage.prompt_token_count,
                completion_tokens: usage.candidates_token_count,
                total_tokens: usage.total_token_count,
            });
        }

        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            result.complete = true;
            result.finish_reason = Some(FinishReason::ContentFilter);
            result.error = Some(format!("prompt blocked: {reason}"));
            return Ok(result);
        }

        if let Some(candidate) = response.candidates.into_iter().next() {
            for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
                self.apply_part(&mut result, part);
            }
            result.grounding_metadata = candidate.grounding_metadata;
            if let Some(reason) = candidate.finish_reason {
                result.complete = true;
                result.finish_reason = Some(map_finish_reason(&reason, self.saw_function_call));
            }
        }

        Ok(result)
    }
}
