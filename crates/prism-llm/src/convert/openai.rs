//! Conversion between canonical types and `OpenAI` chat completion format

use super::{ResponseNormalizer, ToolCallBuffer, call_id, canonical_arguments};
use crate::protocol::openai::{
    OpenAiChoiceMessage, OpenAiContent, OpenAiContentPart, OpenAiFunctionCall, OpenAiImageUrl, OpenAiJsonSchema,
    OpenAiMessage, OpenAiPayload, OpenAiRequest, OpenAiResponseFormat, OpenAiTool, OpenAiToolCall,
};
use crate::tools::schema;
use crate::types::{CompletionOptions, CompletionResult, FinishReason, Message, Role, ToolCall, Usage};

/// Schema name sent with structured output requests
pub(crate) const RESPONSE_SCHEMA_NAME: &str = "response";

// -- Outbound: canonical request -> OpenAI wire format --

/// Build a chat completion request body
///
/// System messages stay inline; Chat Completions accepts them in any position.
pub fn build_request(model_id: &str, messages: &[Message], options: &CompletionOptions, tools: Vec<OpenAiTool>) -> OpenAiRequest {
    let response_format = options.response_schema.as_ref().map_or_else(
        || options.wants_json().then_some(OpenAiResponseFormat::JsonObject),
        |schema_value| {
            Some(OpenAiResponseFormat::JsonSchema {
                json_schema: OpenAiJsonSchema {
                    name: RESPONSE_SCHEMA_NAME.to_owned(),
                    schema: schema::enforce_strict(schema_value),
                    strict: true,
                },
            })
        },
    );

    OpenAiRequest {
        model: model_id.to_owned(),
        messages: messages.iter().map(message_to_openai).collect(),
        tools,
        tool_choice: None,
        response_format,
        max_tokens: options.max_tokens,
        temperature: options.temperature,
        stream: options.stream,
    }
}

fn message_to_openai(msg: &Message) -> OpenAiMessage {
    let role = match msg.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };

    let content = if !msg.images.is_empty() {
        let mut parts = Vec::with_capacity(msg.images.len() + 1);
        if !msg.content.is_empty() {
            parts.push(OpenAiContentPart::Text {
                text: msg.content.clone(),
            });
        }
        parts.extend(msg.images.iter().map(|image| OpenAiContentPart::ImageUrl {
            image_url: OpenAiImageUrl { url: image.data_uri() },
        }));
        Some(OpenAiContent::Parts(parts))
    } else if msg.content.is_empty() && !msg.tool_calls.is_empty() {
        // Assistant turns that only call tools carry no content
        None
    } else {
        Some(OpenAiContent::Text(msg.content.clone()))
    };

    let tool_calls = msg
        .tool_calls
        .iter()
        .enumerate()
        .map(|(position, call)| OpenAiToolCall {
            id: call_id(call, position),
            tool_type: "function".to_owned(),
            function: OpenAiFunctionCall {
                name: call.name.clone(),
                arguments: call.arguments_string(),
            },
        })
        .collect();

    OpenAiMessage {
        role: role.to_owned(),
        content,
        tool_calls,
        tool_call_id: msg.tool_call_id.clone(),
    }
}

// -- Inbound: OpenAI payloads -> canonical result --

/// Map a chat completion finish reason
pub fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "length" => FinishReason::Length,
        "tool_calls" | "function_call" => FinishReason::ToolCalls,
        "content_filter" => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    }
}

/// Normalizer for chat completion bodies and chunks
///
/// Streamed tool calls arrive as fragments keyed by `index`; they are held
/// back until the chunk carrying `finish_reason`.
#[derive(Debug, Default)]
pub struct OpenAiChatNormalizer {
    tool_calls: ToolCallBuffer,
}

impl OpenAiChatNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply_message(result: &mut CompletionResult, message: OpenAiChoiceMessage) {
        if let Some(reasoning) = message.reasoning_content.filter(|r| !r.is_empty()) {
            result.thinking.push(reasoning);
        }
        if let Some(text) = message.content.filter(|t| !t.is_empty()) {
            result.content.push(text);
        }
        if let Some(refusal) = message.refusal.filter(|r| !r.is_empty()) {
            result.content.push(refusal);
        }
        for call in message.tool_calls {
            let function = call.function.unwrap_or_default();
            result.tool_calls.push(ToolCall {
                id: call.id,
                name: function.name.unwrap_or_default(),
                arguments: canonical_arguments(function.arguments.as_deref().unwrap_or_default()),
            });
        }
    }

    fn apply_delta(&mut self, result: &mut CompletionResult, delta: OpenAiChoiceMessage) {
        if let Some(reasoning) = delta.reasoning_content.filter(|r| !r.is_empty()) {
            result.thinking.push(reasoning);
        }
        if let Some(text) = delta.content.filter(|t| !t.is_empty()) {
            result.content.push(text);
        }
        if let Some(refusal) = delta.refusal.filter(|r| !r.is_empty()) {
            result.content.push(refusal);
        }
        for (position, fragment) in delta.tool_calls.into_iter().enumerate() {
            let index = fragment
                .index
                .unwrap_or_else(|| u32::try_from(position).unwrap_or(u32::MAX));
            let function = fragment.function.unwrap_or_default();
            self.tool_calls.start(index, fragment.id, function.name);
            if let Some(arguments) = function.arguments {
                self.tool_calls.append(index, &arguments);
            }
        }
    }
}

impl ResponseNormalizer for OpenAiChatNormalizer {
    fn normalize(&mut self, payload: &str) -> Result<CompletionResult, serde_json::Error> {
        let payload: OpenAiPayload = serde_json::from_str(payload)?;

        if let Some(error) = payload.error {
            return Ok(CompletionResult::failed(error.message));
        }

        let mut result = CompletionResult::default();

        // Only the first choice is surfaced; callers never request n > 1
        if let Some(choice) = payload.choices.into_iter().find(|c| c.index == 0) {
            if let Some(message) = choice.message {
                Self::apply_message(&mut result, message);
            }
            if let Some(delta) = choice.delta {
                self.apply_delta(&mut result, delta);
            }
            if let Some(reason) = choice.finish_reason {
                result.tool_calls.extend(self.tool_calls.drain());
                result.complete = true;
                result.finish_reason = Some(map_finish_reason(&reason));
            }
        }

        result.usage = payload
            .usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            });

        Ok(result)
    }

    fn flush(&mut self) -> CompletionResult {
        CompletionResult {
            tool_calls: self.tool_calls.drain(),
            ..CompletionResult::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::InlineImage;

    #[test]
    fn request_replays_tool_turns() {
        let messages = vec![
            Message::system("You are terse."),
            Message::user("Weather in Paris?").with_image(InlineImage::new("image/png", "AAAA")),
            Message::assistant("").with_tool_calls(vec![ToolCall {
                id: Some("call_1".to_owned()),
                name: "get_weather".to_owned(),
                arguments: json!({"city": "Paris"}),
            }]),
            Message::tool_result("call_1", "get_weather", r#"{"temp":21}"#),
        ];

        let request = build_request("gpt-4o", &messages, &CompletionOptions::default(), Vec::new());
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["messages"][0], json!({"role": "system", "content": "You are terse."}));
        assert_eq!(body["messages"][1]["content"][1]["image_url"]["url"], "data:image/png;base64,AAAA");
        assert!(body["messages"][2].get("content").is_none());
        assert_eq!(body["messages"][2]["tool_calls"][0]["function"]["arguments"], r#"{"city":"Paris"}"#);
        assert_eq!(body["messages"][3]["tool_call_id"], "call_1");
        assert_eq!(body["stream"], false);
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn request_uses_strict_json_schema() {
        let options = CompletionOptions {
            response_schema: Some(json!({"type": "object", "properties": {"answer": {"type": "string"}}})),
            ..CompletionOptions::default()
        };
        let body = serde_json::to_value(build_request("gpt-4o", &[Message::user("hi")], &options, Vec::new())).unwrap();

        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
        assert_eq!(body["response_format"]["json_schema"]["schema"]["required"], json!(["answer"]));
        assert_eq!(
            body["response_format"]["json_schema"]["schema"]["additionalProperties"],
            false
        );
    }

    #[test]
    fn body_is_normalized() {
        let mut normalizer = OpenAiChatNormalizer::new();
        let result = normalizer
            .normalize(
                &json!({
                    "id": "chatcmpl-1",
                    "object": "chat.completion",
                    "choices": [{
                        "index": 0,
                        "message": {
                            "role": "assistant",
                            "content": null,
                            "tool_calls": [{
                                "id": "call_9",
                                "type": "function",
                                "function": {"name": "get_weather", "arguments": "{\"city\":\"Oslo\"}"}
                            }]
                        },
                        "finish_reason": "tool_calls"
                    }],
                    "usage": {"prompt_tokens": 12, "completion_tokens": 7, "total_tokens": 19}
                })
                .to_string(),
            )
            .unwrap();

        assert!(result.complete);
        assert_eq!(result.finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(result.tool_calls[0].arguments, json!({"city": "Oslo"}));
        assert_eq!(result.usage.map(|u| u.total_tokens), Some(19));
    }

    #[test]
    fn streamed_tool_call_is_emitted_once_complete() {
        let mut normalizer = OpenAiChatNormalizer::new();
        let chunks = [
            json!({"choices": [{"index": 0, "delta": {"role": "assistant", "tool_calls": [{"index": 0, "id": "call_1", "type": "function", "function": {"name": "lookup", "arguments": ""}}]}}]}),
            json!({"choices": [{"index": 0, "delta": {"tool_calls": [{"index": 0, "function": {"arguments": "{\"q\":"}}]}}]}),
            json!({"choices": [{"index": 0, "delta": {"tool_calls": [{"index": 0, "function": {"arguments": "\"rust\"}"}}]}}]}),
            json!({"choices": [{"index": 0, "delta": {}, "finish_reason": "tool_calls"}]}),
        ];

        let results: Vec<_> = chunks
            .iter()
            .map(|c| normalizer.normalize(&c.to_string()).unwrap())
            .collect();

        assert!(results[..3].iter().all(|r| r.tool_calls.is_empty() && !r.complete));
        assert_eq!(results[3].tool_calls.len(), 1);
        assert_eq!(results[3].tool_calls[0].id.as_deref(), Some("call_1"));
        assert_eq!(results[3].tool_calls[0].arguments, json!({"q": "rust"}));
    }

    #[test]
    fn reasoning_content_goes_to_thinking() {
        let mut normalizer = OpenAiChatNormalizer::new();
        let result = normalizer
            .normalize(r#"{"choices":[{"index":0,"delta":{"reasoning_content":"Let me think","content":""}}]}"#)
            .unwrap();
        assert_eq!(result.thinking, vec!["Let me think"]);
        assert!(result.content.is_empty());
    }

    #[test]
    fn error_payload_completes_with_error() {
        let mut normalizer = OpenAiChatNormalizer::new();
        let result = normalizer
            .normalize(r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#)
            .unwrap();
        assert!(result.complete);
        assert_eq!(result.finish_reason, Some(FinishReason::Error));
        assert_eq!(result.error.as_deref(), Some("Rate limit reached"));
    }

    #[test]
    fn finish_reason_mapping() {
        assert_eq!(map_finish_reason("stop"), FinishReason::Stop);
        assert_eq!(map_finish_reason("length"), FinishReason::Length);
        assert_eq!(map_finish_reason("function_call"), FinishReason::ToolCalls);
        assert_eq!(map_finish_reason("content_filter"), FinishReason::ContentFilter);
        assert_eq!(map_finish_reason("eos"), FinishReason::Stop);
    }
}
