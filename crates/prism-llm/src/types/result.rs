use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::message::{InlineImage, ToolCall};

/// Reason the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of generation
    Stop,
    /// Hit the token limit
    Length,
    /// Model decided to call a tool
    ToolCalls,
    /// Content was filtered by safety systems
    ContentFilter,
    /// Vendor reported an error or the stream could not be decoded
    Error,
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt
    pub prompt_tokens: u32,
    /// Tokens generated in the completion
    pub completion_tokens: u32,
    /// Total tokens (prompt + completion)
    pub total_tokens: u32,
}

impl Usage {
    pub const fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Canonical completion result, either whole or one streaming delta
///
/// Streaming deltas only carry what is new since the previous delta; fold them
/// together with [`CompletionResult::append`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionResult {
    /// Visible text segments in order
    #[serde(default)]
    pub content: Vec<String>,
    /// Final generated images
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<InlineImage>,
    /// Completed tool calls
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Reasoning text, kept apart from the answer
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub thinking: Vec<String>,
    /// Search grounding and citation data exactly as the vendor sent it
    ///
    /// Google's `groundingMetadata` is copied whole. `OpenAI` Responses and
    /// Anthropic citations are gathered into lists under `annotations`,
    /// `web_search_calls`, `citations` and `search_results`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_metadata: Option<Value>,
    /// Whether the vendor signalled the end of the response
    #[serde(default)]
    pub complete: bool,
    /// Why generation stopped (set once complete)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    /// Token usage, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// Vendor error message accompanying `FinishReason::Error`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompletionResult {
    /// Completed result carrying only a finish reason
    pub fn finished(reason: FinishReason) -> Self {
        Self {
            complete: true,
            finish_reason: Some(reason),
            ..Self::default()
        }
    }

    /// Completed result for a vendor-reported error
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::finished(FinishReason::Error)
        }
    }

    /// Whether the result carries nothing at all
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
            && self.images.is_empty()
            && self.tool_calls.is_empty()
            && self.thinking.is_empty()
            && self.grounding_metadata.is_none()
            && !self.complete
            && self.finish_reason.is_none()
            && self.usage.is_none()
            && self.error.is_none()
    }

    /// All visible text joined together
    pub fn text(&self) -> String {
        self.content.concat()
    }

    /// Add vendor citation entries under `key` of the grounding metadata
    pub fn add_grounding(&mut self, key: &str, entries: impl IntoIterator<Item = Value>) {
        let entries: Vec<Value> = entries.into_iter().collect();
        if entries.is_empty() {
            return;
        }
        let mut object = Map::new();
        object.insert(key.to_owned(), Value::Array(entries));
        merge_grounding(&mut self.grounding_metadata, Value::Object(object));
    }

    /// Fold a later delta into this result
    ///
    /// Lists are extended in order; scalar fields take the newer value when
    /// the delta has one. Grounding objects are merged key by key, with
    /// arrays concatenated.
    pub fn append(&mut self, delta: Self) {
        self.content.extend(delta.content);
        self.images.extend(delta.images);
        self.tool_calls.extend(delta.tool_calls);
        self.thinking.extend(delta.thinking);
        if let Some(grounding) = delta.grounding_metadata {
            merge_grounding(&mut self.grounding_metadata, grounding);
        }
        self.complete |= delta.complete;
        if delta.finish_reason.is_some() {
            self.finish_reason = delta.finish_reason;
        }
        if delta.usage.is_some() {
            self.usage = delta.usage;
        }
        if delta.error.is_some() {
            self.error = delta.error;
        }
    }
}

fn merge_grounding(current: &mut Option<Value>, incoming: Value) {
    match (current, incoming) {
        (Some(Value::Object(existing)), Value::Object(incoming)) => {
            for (key, value) in incoming {
                let slot = existing.entry(key).or_insert(Value::Null);
                match (slot, value) {
                    (Value::Array(items), Value::Array(more)) => items.extend(more),
                    (slot, value) => *slot = value,
                }
            }
        }
        (current, incoming) => *current = Some(incoming),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn append_extends_lists_in_order() {
        let mut total = CompletionResult {
            content: vec!["Hel".to_owned()],
            thinking: vec!["plan".to_owned()],
            ..CompletionResult::default()
        };
        total.append(CompletionResult {
            content: vec!["lo".to_owned()],
            ..CompletionResult::default()
        });
        total.append(CompletionResult {
            usage: Some(Usage::new(3, 4)),
            ..CompletionResult::finished(FinishReason::Stop)
        });

        assert_eq!(total.text(), "Hello");
        assert_eq!(total.thinking, vec!["plan"]);
        assert!(total.complete);
        assert_eq!(total.finish_reason, Some(FinishReason::Stop));
        assert_eq!(total.usage.map(|u| u.total_tokens), Some(7));
    }

    #[test]
    fn append_never_clears_completion() {
        let mut total = CompletionResult::finished(FinishReason::Length);
        total.append(CompletionResult::default());
        assert!(total.complete);
        assert_eq!(total.finish_reason, Some(FinishReason::Length));
    }

    #[test]
    fn empty_detection() {
        assert!(CompletionResult::default().is_empty());
        assert!(!CompletionResult::finished(FinishReason::Stop).is_empty());
        assert!(!CompletionResult::failed("boom").is_empty());
    }

    #[test]
    fn serializes_finish_reason_snake_case() {
        let value = serde_json::to_value(CompletionResult::finished(FinishReason::ContentFilter)).unwrap();
        assert_eq!(value["finish_reason"], "content_filter");
        assert_eq!(value["complete"], true);
        assert!(value.get("images").is_none());
    }

    #[test]
    fn grounding_lists_accumulate_across_deltas() {
        let mut total = CompletionResult::default();
        total.add_grounding("citations", [json!({"url": "https://a.example"})]);

        let mut delta = CompletionResult::default();
        delta.add_grounding("citations", [json!({"url": "https://b.example"})]);
        delta.add_grounding("search_results", [json!({"type": "web_search_tool_result"})]);
        delta.add_grounding("ignored", Vec::new());
        total.append(delta);

        assert_eq!(
            total.grounding_metadata,
            Some(json!({
                "citations": [{"url": "https://a.example"}, {"url": "https://b.example"}],
                "search_results": [{"type": "web_search_tool_result"}]
            }))
        );
    }

    #[test]
    fn non_list_grounding_is_replaced() {
        let mut total = CompletionResult {
            grounding_metadata: Some(json!({"searchEntryPoint": {"renderedContent": "old"}})),
            ..CompletionResult::default()
        };
        total.append(CompletionResult {
            grounding_metadata: Some(json!({"searchEntryPoint": {"renderedContent": "new"}})),
            ..CompletionResult::default()
        });
        assert_eq!(total.grounding_metadata, Some(json!({"searchEntryPoint": {"renderedContent": "new"}})));
    }
}
