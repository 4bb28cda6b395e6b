//! Conversion between canonical types and Anthropic wire format

use serde_json::json;

use super::{ResponseNormalizer, ToolCallBuffer, call_id, system_text};
use crate::protocol::anthropic::{
    AnthropicContentBlock, AnthropicCustomTool, AnthropicImageSource, AnthropicMessage, AnthropicPayload,
    AnthropicRequest, AnthropicResponseBlock, AnthropicStreamDelta, AnthropicTool, AnthropicToolChoice,
};
use crate::types::{CompletionOptions, CompletionResult, FinishReason, Message, Role, ToolCall, Usage};

/// Name of the synthesized tool that carries structured output
pub const JSON_TOOL_NAME: &str = "json";

// -- Outbound: canonical request -> Anthropic wire format --

/// Build a Messages API request body
///
/// Anthropic has no `response_format`; JSON output is requested by adding a
/// `json` tool whose input schema is the response schema and forcing the
/// model to call it.
pub fn build_request(
    model_id: &str,
    messages: &[Message],
    options: &CompletionOptions,
    mut tools: Vec<AnthropicTool>,
    default_max_tokens: u32,
) -> AnthropicRequest {
    let mut tool_choice = None;
    if options.wants_json() {
        let input_schema = options
            .response_schema
            .clone()
            .unwrap_or_else(|| json!({"type": "object"}));
        tools.push(AnthropicTool::Custom(AnthropicCustomTool {
            name: JSON_TOOL_NAME.to_owned(),
            description: Some("Respond with a JSON object".to_owned()),
            input_schema,
        }));
        tool_choice = Some(AnthropicToolChoice {
            choice_type: "tool".to_owned(),
            name: Some(JSON_TOOL_NAME.to_owned()),
        });
    }

    AnthropicRequest {
        model: model_id.to_owned(),
        max_tokens: options.max_tokens.unwrap_or(default_max_tokens),
        system: system_text(messages),
        messages: merge_consecutive(messages.iter().filter(|m| m.role != Role::System).map(message_to_anthropic)),
        temperature: options.temperature,
        stream: options.stream.then_some(true),
        tools,
        tool_choice,
    }
}

/// Anthropic rejects two consecutive messages with the same role
fn merge_consecutive(messages: impl Iterator<Item = AnthropicMessage>) -> Vec<AnthropicMessage> {
    let mut merged: Vec<AnthropicMessage> = Vec::new();
    for msg in messages {
        match merged.last_mut() {
            Some(last) if last.role == msg.role => last.content.extend(msg.content),
            _ => merged.push(msg),
        }
    }
    merged
}

fn message_to_anthropic(msg: &Message) -> AnthropicMessage {
    let mut blocks = Vec::new();

    if msg.role == Role::Tool {
        blocks.push(AnthropicContentBlock::ToolResult {
            tool_use_id: msg.tool_call_id.clone().unwrap_or_default(),
            content: msg.content.clone(),
        });
        return AnthropicMessage {
            role: "user".to_owned(),
            content: blocks,
        };
    }

    if !msg.content.is_empty() {
        blocks.push(AnthropicContentBlock::Text {
            text: msg.content.clone(),
        });
    }
    blocks.extend(msg.images.iter().map(|image| AnthropicContentBlock::Image {
        source: AnthropicImageSource {
            source_type: "base64".to_owned(),
            media_type: image.mime_type.clone(),
            data: image.data.clone(),
        },
    }));
    blocks.extend(
        msg.tool_calls
            .iter()
            .enumerate()
            .map(|(position, call)| AnthropicContentBlock::ToolUse {
                id: call_id(call, position),
                name: call.name.clone(),
                input: if call.arguments.is_object() {
                    call.arguments.clone()
                } else {
                    json!({})
                },
            }),
    );
    if blocks.is_empty() {
        blocks.push(AnthropicContentBlock::Text { text: String::new() });
    }

    let role = if msg.role == Role::Assistant { "assistant" } else { "user" };
    AnthropicMessage {
        role: role.to_owned(),
        content: blocks,
    }
}

// -- Inbound: Anthropic payloads -> canonical result --

/// Map an Anthropic stop reason
pub fn map_stop_reason(reason: &str, json_tool: bool) -> FinishReason {
    match reason {
        "max_tokens" => FinishReason::Length,
        "tool_use" if json_tool => FinishReason::Stop,
        "tool_use" => FinishReason::ToolCalls,
        "refusal" => FinishReason::ContentFilter,
        // end_turn, stop_sequence, pause_turn
        _ => FinishReason::Stop,
    }
}

/// Record a `web_search_tool_result` block under `search_results`
fn add_search_results(result: &mut CompletionResult, mut block: serde_json::Map<String, serde_json::Value>) {
    block.insert("type".to_owned(), json!("web_search_tool_result"));
    result.add_grounding("search_results", [serde_json::Value::Object(block)]);
}

/// Normalizer for Anthropic bodies and stream events
///
/// Tool input JSON is accumulated per content block and emitted at
/// `content_block_stop`. With the JSON tool active, its input is surfaced as
/// content instead of a tool call. Web search results and text citations are
/// kept in the grounding metadata.
#[derive(Debug, Default)]
pub struct AnthropicNormalizer {
    json_tool: bool,
    tool_blocks: ToolCallBuffer,
    input_tokens: u32,
    completed: bool,
}

impl AnthropicNormalizer {
    /// Normalizer for a request that did or did not use the JSON tool
    pub fn new(json_tool: bool) -> Self {
        Self {
            json_tool,
            ..Self::default()
        }
    }

    fn finish_tool_call(&self, result: &mut CompletionResult, call: ToolCall, raw: Option<String>) {
        if self.json_tool && call.name == JSON_TOOL_NAME {
            result.content.push(raw.unwrap_or_else(|| call.arguments.to_string()));
        } else {
            result.tool_calls.push(call);
        }
    }

    fn complete(&mut self, result: &mut CompletionResult, reason: FinishReason) {
        self.completed = true;
        result.complete = true;
        result.finish_reason = Some(reason);
    }
}

impl ResponseNormalizer for AnthropicNormalizer {
    fn normalize(&mut self, payload: &str) -> Result<CompletionResult, serde_json::Error> {
        let payload: AnthropicPayload = serde_json::from_str(payload)?;
        let mut result = CompletionResult::default();

        match payload {
            AnthropicPayload::Message(response) => {
                for block in response.content {
                    match block {
                        AnthropicResponseBlock::Text { text, citations } => {
                            result.add_grounding("citations", citations.unwrap_or_default());
                            result.content.push(text);
                        }
                        AnthropicResponseBlock::Thinking { thinking } => result.thinking.push(thinking),
                        AnthropicResponseBlock::ToolUse { id, name, input } => {
                            let call = ToolCall {
                                id: Some(id),
                                name,
                                arguments: if input.is_null() { json!({}) } else { input },
                            };
                            self.finish_tool_call(&mut result, call, None);
                        }
                        AnthropicResponseBlock::WebSearchToolResult(block) => add_search_results(&mut result, block),
                        AnthropicResponseBlock::Other => {}
                    }
                }
                if let Some(usage) = response.usage {
                    result.usage = Some(Usage::new(usage.input_tokens, usage.output_tokens));
                }
                if let Some(reason) = response.stop_reason {
                    self.complete(&mut result, map_stop_reason(&reason, self.json_tool));
                }
            }

            AnthropicPayload::MessageStart { message } => {
                self.input_tokens = message.usage.map_or(0, |u| u.input_tokens);
            }

            AnthropicPayload::ContentBlockStart { index, content_block } => match content_block {
                AnthropicResponseBlock::Text { text, citations } => {
                    result.add_grounding("citations", citations.unwrap_or_default());
                    if !text.is_empty() {
                        result.content.push(text);
                    }
                }
                AnthropicResponseBlock::Thinking { thinking } if !thinking.is_empty() => result.thinking.push(thinking),
                AnthropicResponseBlock::ToolUse { id, name, .. } => self.tool_blocks.start(index, Some(id), Some(name)),
                AnthropicResponseBlock::WebSearchToolResult(block) => add_search_results(&mut result, block),
                _ => {}
            },

            AnthropicPayload::ContentBlockDelta { index, delta } => match delta {
                AnthropicStreamDelta::TextDelta { text } => result.content.push(text),
                AnthropicStreamDelta::ThinkingDelta { thinking } => result.thinking.push(thinking),
                AnthropicStreamDelta::InputJsonDelta { partial_json } => self.tool_blocks.append(index, &partial_json),
                AnthropicStreamDelta::CitationsDelta { citation } => result.add_grounding("citations", [citation]),
                AnthropicStreamDelta::Other => {}
            },

            AnthropicPayload::ContentBlockStop { index } => {
                if let Some(pending) = self.tool_blocks.take(index) {
                    let raw = pending.arguments.clone();
                    let call = pending.into_tool_call();
                    let raw = (!raw.trim().is_empty()).then_some(raw);
                    self.finish_tool_call(&mut result, call, raw);
                }
            }

            AnthropicPayload::MessageDelta { delta, usage } => {
                if let Some(usage) = usage {
                    result.usage = Some(Usage::new(self.input_tokens, usage.output_tokens));
                }
                if let Some(reason) = delta.stop_reason {
                    self.complete(&mut result, map_stop_reason(&reason, self.json_tool));
                }
            }

            AnthropicPayload::MessageStop => {
                if !self.completed {
                    self.complete(&mut result, FinishReason::Stop);
                }
            }

            AnthropicPayload::Error { error } => {
                self.completed = true;
                result = CompletionResult::failed(format!("{}: {}", error.error_type, error.message));
            }

            AnthropicPayload::Ping | AnthropicPayload::Other => {}
        }

        Ok(result)
    }

    fn flush(&mut self) -> CompletionResult {
        let mut result = CompletionResult::default();
        for call in self.tool_blocks.drain() {
            self.finish_tool_call(&mut result, call, None);
        }
        result
    }
}
