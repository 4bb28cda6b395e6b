//! Conversion between canonical types and vendor wire formats
//!
//! Each submodule builds its vendor's request body from canonical messages and
//! implements the [`ResponseNormalizer`] that turns vendor payloads back into
//! canonical results.

pub mod anthropic;
pub mod google;
pub mod openai;
pub mod openai_responses;

use std::collections::BTreeMap;

use serde_json::{Value, json};

use crate::types::{CompletionResult, Message, Role, ToolCall};

/// Extracts canonical result deltas from vendor payloads
///
/// A normalizer is created per request and may keep state between payloads,
/// e.g. tool call arguments that arrive in fragments. Each call returns only
/// what is new.
pub trait ResponseNormalizer: Send {
    /// Normalize one payload: a full body or a single streaming event
    fn normalize(&mut self, payload: &str) -> Result<CompletionResult, serde_json::Error>;

    /// Emit whatever is still pending when the input ends early
    fn flush(&mut self) -> CompletionResult {
        CompletionResult::default()
    }
}

/// Decode vendor-supplied tool call arguments
///
/// Empty input means "no arguments". A `Value::String` result always holds
/// the raw text: text that is not JSON is kept verbatim, and so is a JSON
/// string literal, quotes included. [`ToolCall::arguments_string`] then gives
/// back exactly what the model produced.
pub fn canonical_arguments(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return json!({});
    }
    match serde_json::from_str(trimmed) {
        Ok(Value::String(_)) => Value::String(raw.to_owned()),
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "tool call arguments are not valid JSON, keeping raw text");
            Value::String(raw.to_owned())
        }
    }
}

/// Joined system instructions, `None` when there are none
pub(crate) fn system_text(messages: &[Message]) -> Option<String> {
    let parts: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System && !m.content.is_empty())
        .map(|m| m.content.as_str())
        .collect();
    (!parts.is_empty()).then(|| parts.join("\n\n"))
}

/// Identifier for a replayed tool call that never had one
pub(crate) fn call_id(call: &ToolCall, position: usize) -> String {
    call.id.clone().unwrap_or_else(|| format!("call_{position}"))
}

/// Tool call whose arguments are still streaming
#[derive(Debug, Clone, Default)]
pub(crate) struct PendingToolCall {
    pub id: Option<String>,
    pub name: String,
    pub arguments: String,
}

impl PendingToolCall {
    pub fn into_tool_call(self) -> ToolCall {
        ToolCall {
            id: self.id,
            name: self.name,
            arguments: canonical_arguments(&self.arguments),
        }
    }
}

/// Streamed tool call fragments keyed by the vendor's index
#[derive(Debug, Default)]
pub(crate) struct ToolCallBuffer {
    calls: BTreeMap<u32, PendingToolCall>,
}

impl ToolCallBuffer {
    /// Record identifying fields; later fragments may fill what is missing
    pub fn start(&mut self, index: u32, id: Option<String>, name: Option<String>) {
        let call = self.calls.entry(index).or_default();
        if id.is_some() {
            call.id = id;
        }
        if let Some(name) = name
            && call.name.is_empty()
        {
            call.name = name;
        }
    }

    /// Append an arguments fragment
    pub fn append(&mut self, index: u32, fragment: &str) {
        self.calls.entry(index).or_default().arguments.push_str(fragment);
    }

    /// Remove one finished call
    pub fn take(&mut self, index: u32) -> Option<PendingToolCall> {
        self.calls.remove(&index)
    }

    /// Remove every call in index order
    pub fn drain(&mut self) -> Vec<ToolCall> {
        std::mem::take(&mut self.calls)
            .into_values()
            .filter(|call| !call.name.is_empty())
            .map(PendingToolCall::into_tool_call)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_arguments_are_an_empty_object() {
        assert_eq!(canonical_arguments(""), json!({}));
        assert_eq!(canonical_arguments("  \n"), json!({}));
    }

    #[test]
    fn arguments_are_parsed() {
        assert_eq!(canonical_arguments(r#"{"city":"Paris"}"#), json!({"city": "Paris"}));
    }

    #[test]
    fn broken_arguments_are_kept_verbatim() {
        assert_eq!(canonical_arguments(r#"{"city":"Par"#), Value::String(r#"{"city":"Par"#.to_owned()));
    }

    #[test]
    fn string_literal_and_broken_text_stay_distinct() {
        let literal = canonical_arguments(r#""Paris""#);
        let broken = canonical_arguments("Paris");
        assert_ne!(literal, broken);

        let resend = |arguments| ToolCall { id: None, name: "lookup".to_owned(), arguments }.arguments_string();
        assert_eq!(resend(literal), r#""Paris""#);
        assert_eq!(resend(broken), "Paris");
    }

    #[test]
    fn system_messages_are_joined() {
        let messages = vec![
            Message::system("Be brief."),
            Message::user("hi"),
            Message::system("Answer in French."),
        ];
        assert_eq!(system_text(&messages).as_deref(), Some("Be brief.\n\nAnswer in French."));
        assert_eq!(system_text(&[Message::user("hi")]), None);
    }

    #[test]
    fn buffer_assembles_fragments_in_index_order() {
        let mut buffer = ToolCallBuffer::default();
        buffer.start(1, Some("call_b".to_owned()), Some("second".to_owned()));
        buffer.start(0, Some("call_a".to_owned()), Some("first".to_owned()));
        buffer.append(0, r#"{"a":"#);
        buffer.append(1, "{}");
        buffer.append(0, "1}");

        let calls = buffer.drain();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "first");
        assert_eq!(calls[0].arguments, json!({"a": 1}));
        assert_eq!(calls[1].id.as_deref(), Some("call_b"));
        assert!(buffer.drain().is_empty());
    }
}
