//! Conversion between canonical types and `OpenAI` Responses format

use super::openai::RESPONSE_SCHEMA_NAME;
use super::{ResponseNormalizer, call_id, canonical_arguments, system_text};
use crate::protocol::openai_responses::{
    ResponsesBody, ResponsesInputContent, ResponsesInputItem, ResponsesOutputContent, ResponsesOutputItem,
    ResponsesPayload, ResponsesRequest, ResponsesStreamEvent, ResponsesTextConfig, ResponsesTextFormat, ResponsesTool,
};
use crate::tools::schema;
use crate::types::{CompletionOptions, CompletionResult, FinishReason, InlineImage, Message, Role, ToolCall, Usage};

// -- Outbound: canonical request -> Responses wire format --

/// Build a `/responses` request body
///
/// System messages move to `instructions`; everything else becomes `input`
/// items, with assistant tool calls and tool results as their own items.
pub fn build_request(
    model_id: &str,
    messages: &[Message],
    options: &CompletionOptions,
    tools: Vec<ResponsesTool>,
    store: bool,
) -> ResponsesRequest {
    let mut input = Vec::with_capacity(messages.len());
    for msg in messages {
        match msg.role {
            Role::System => {}
            Role::User => input.push(ResponsesInputItem::Message {
                role: "user".to_owned(),
                content: user_content(msg),
            }),
            Role::Assistant => {
                if !msg.content.is_empty() {
                    input.push(ResponsesInputItem::Message {
                        role: "assistant".to_owned(),
                        content: vec![ResponsesInputContent::OutputText {
                            text: msg.content.clone(),
                            annotations: None,
                        }],
                    });
                }
                input.extend(
                    msg.tool_calls
                        .iter()
                        .enumerate()
                        .map(|(position, call)| ResponsesInputItem::FunctionCall {
                            call_id: call_id(call, position),
                            name: call.name.clone(),
                            arguments: call.arguments_string(),
                        }),
                );
            }
            Role::Tool => input.push(ResponsesInputItem::FunctionCallOutput {
                call_id: msg.tool_call_id.clone().unwrap_or_default(),
                output: msg.content.clone(),
            }),
        }
    }

    let format = options.response_schema.as_ref().map_or_else(
        || options.wants_json().then_some(ResponsesTextFormat::JsonObject),
        |schema_value| {
            Some(ResponsesTextFormat::JsonSchema {
                name: RESPONSE_SCHEMA_NAME.to_owned(),
                schema: schema::enforce_strict(schema_value),
                strict: true,
            })
        },
    );

    ResponsesRequest {
        model: model_id.to_owned(),
        instructions: system_text(messages),
        input,
        tools,
        text: format.map(|format| ResponsesTextConfig { format }),
        max_output_tokens: options.max_tokens,
        temperature: options.temperature,
        store,
        stream: options.stream,
    }
}

fn user_content(msg: &Message) -> Vec<ResponsesInputContent> {
    let mut content = Vec::with_capacity(msg.images.len() + 1);
    if !msg.content.is_empty() || msg.images.is_empty() {
        content.push(ResponsesInputContent::InputText {
            text: msg.content.clone(),
        });
    }
    content.extend(msg.images.iter().map(|image| ResponsesInputContent::InputImage {
        image_url: image.data_uri(),
    }));
    content
}

// -- Inbound: Responses payloads -> canonical result --

/// Normalizer for Responses bodies and stream events
///
/// In streams, text and reasoning arrive as deltas, so the text of finished
/// `message` and `reasoning` items is ignored; function calls, generated
/// images and citations only surface from finished items. Partial images are
/// never emitted.
#[derive(Debug, Default)]
pub struct OpenAiResponsesNormalizer {
    saw_function_call: bool,
}

impl OpenAiResponsesNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn function_call(&mut self, call_id: Option<String>, name: String, arguments: &str) -> ToolCall {
        self.saw_function_call = true;
        ToolCall {
            id: call_id,
            name,
            arguments: canonical_arguments(arguments),
        }
    }

    fn generated_image(result: Option<String>, output_format: Option<&str>) -> Option<InlineImage> {
        let data = result.filter(|d| !d.is_empty())?;
        Some(InlineImage::new(format!("image/{}", output_format.unwrap_or("png")), data))
    }

    /// Canonical items from a finished output item, streaming or not
    fn apply_item(&mut self, result: &mut CompletionResult, item: ResponsesOutputItem, streaming: bool) {
        match item {
            ResponsesOutputItem::FunctionCall {
                call_id,
                name,
                arguments,
            } => {
                let call = self.function_call(call_id, name, &arguments);
                result.tool_calls.push(call);
            }
            ResponsesOutputItem::ImageGenerationCall { result: data, output_format } => {
                result
                    .images
                    .extend(Self::generated_image(data, output_format.as_deref()));
            }
            ResponsesOutputItem::Message { content } => {
                for part in content {
                    match part {
                        ResponsesOutputContent::OutputText { text, annotations } => {
                            result.add_grounding("annotations", annotations.unwrap_or_default());
                            if !streaming {
                                result.content.push(text);
                            }
                        }
                        ResponsesOutputContent::Refusal { refusal } if !streaming => result.content.push(refusal),
                        _ => {}
                    }
                }
            }
            ResponsesOutputItem::WebSearchCall(mut call) => {
                call.insert("type".to_owned(), serde_json::Value::from("web_search_call"));
                result.add_grounding("web_search_calls", [serde_json::Value::Object(call)]);
            }
            ResponsesOutputItem::Reasoning { summary } if !streaming => {
                result
                    .thinking
                    .extend(summary.into_iter().map(|s| s.text).filter(|t| !t.is_empty()));
            }
            _ => {}
        }
    }

    /// Completion state carried by a final response object
    fn apply_status(&self, result: &mut CompletionResult, body: &ResponsesBody) {
        result.usage = body
            .usage
            .map(|u| Usage::new(u.input_tokens, u.output_tokens));

        match body.status.as_deref() {
            Some("completed") => {
                result.complete = true;
                result.finish_reason = Some(if self.saw_function_call {
                    FinishReason::ToolCalls
                } else {
                    FinishReason::Stop
                });
            }
            Some("incomplete") => {
                let reason = body.incomplete_details.as_ref().and_then(|d| d.reason.as_deref());
                result.complete = true;
                result.finish_reason = Some(match reason {
                    Some("content_filter") => FinishReason::ContentFilter,
                    _ => FinishReason::Length,
                });
            }
            Some("failed" | "cancelled") => {
                let message = body
                    .error
                    .as_ref()
                    .map_or_else(|| "response failed".to_owned(), |e| e.message.clone());
                result.complete = true;
                result.finish_reason = Some(FinishReason::Error);
                result.error = Some(message);
            }
            _ => {}
        }
    }
}

impl ResponseNormalizer for OpenAiResponsesNormalizer {
    fn normalize(&mut self, payload: &str) -> Result<CompletionResult, serde_json::Error> {
        let payload = ResponsesPayload::from_value(serde_json::from_str(payload)?)?;
        let mut result = CompletionResult::default();

        match payload {
            ResponsesPayload::Event(event) => match event {
                ResponsesStreamEvent::OutputTextDelta { delta } => {
                    if !delta.is_empty() {
                        result.content.push(delta);
                    }
                }
                ResponsesStreamEvent::ReasoningSummaryDelta { delta }
                | ResponsesStreamEvent::ReasoningTextDelta { delta } => {
                    if !delta.is_empty() {
                        result.thinking.push(delta);
                    }
                }
                ResponsesStreamEvent::OutputItemDone { item } => self.apply_item(&mut result, item, true),
                ResponsesStreamEvent::Completed { response }
                | ResponsesStreamEvent::Incomplete { response }
                | ResponsesStreamEvent::Failed { response } => self.apply_status(&mut result, &response),
                ResponsesStreamEvent::Error { code, message } => {
                    let message = code.map_or_else(|| message.clone(), |code| format!("{code}: {message}"));
                    result = CompletionResult::failed(message);
                }
                ResponsesStreamEvent::Other => {}
            },
            ResponsesPayload::Body(mut body) => {
                for item in std::mem::take(&mut body.output) {
                    self.apply_item(&mut result, item, false);
                }
                self.apply_status(&mut result, &body);
            }
        }

        Ok(result)
    }
}
