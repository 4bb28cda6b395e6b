use serde::{Deserialize, Serialize};

/// Role of a message participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instruction
    System,
    /// User message
    User,
    /// Assistant response
    Assistant,
    /// Tool/function result
    Tool,
}

/// Message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message author
    pub role: Role,
    /// Text content
    #[serde(default)]
    pub content: String,
    /// Images attached to the message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<InlineImage>,
    /// ID of the tool call this message answers (tool role only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Function name the tool result belongs to (tool role only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Tool calls the assistant requested in this turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            images: Vec::new(),
            tool_call_id: None,
            name: None,
            tool_calls: Vec::new(),
        }
    }

    /// System instruction
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// User turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Result of a tool invocation requested by the assistant
    pub fn tool_result(tool_call_id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
            ..Self::with_role(Role::Tool, content)
        }
    }

    /// Attach an image
    #[must_use]
    pub fn with_image(mut self, image: InlineImage) -> Self {
        self.images.push(image);
        self
    }

    /// Attach tool calls (assistant turns)
    #[must_use]
    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = tool_calls;
        self
    }
}

/// Base64-encoded binary payload with its MIME type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineImage {
    /// MIME type (e.g. "image/png")
    pub mime_type: String,
    /// Base64-encoded bytes
    pub data: String,
}

impl InlineImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Render as a `data:` URI
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Parse a base64 `data:` URI
    pub fn from_data_uri(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix("data:")?;
        let (mime_and_encoding, data) = rest.split_once(',')?;
        let mime_type = mime_and_encoding.strip_suffix(";base64")?;
        Some(Self::new(mime_type, data))
    }
}

/// A tool invocation requested by the model
///
/// `arguments` holds parsed JSON, whatever the vendor sent: string encoded
/// arguments are decoded and an empty string becomes `{}`. A string value is
/// raw argument text, either text that is not JSON or a JSON string literal
/// with its quotes, and is sent back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Vendor-assigned call identifier, when the vendor provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Function name as sent to the vendor
    pub name: String,
    /// Decoded call arguments
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Arguments re-encoded as a JSON string for vendors that expect one
    ///
    /// String values are raw text and are returned as is.
    pub fn arguments_string(&self) -> String {
        match &self.arguments {
            serde_json::Value::String(raw) => raw.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_round_trips() {
        let image = InlineImage::from_data_uri("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "iVBORw0KGgo=");
        assert_eq!(image.data_uri(), "data:image/png;base64,iVBORw0KGgo=");
    }

    #[test]
    fn non_base64_data_uri_is_rejected() {
        assert!(InlineImage::from_data_uri("data:text/plain,hello").is_none());
        assert!(InlineImage::from_data_uri("https://example.com/cat.png").is_none());
    }

    #[test]
    fn unparsed_arguments_are_sent_verbatim() {
        let call = ToolCall {
            id: None,
            name: "lookup".to_owned(),
            arguments: serde_json::Value::String("{not json".to_owned()),
        };
        assert_eq!(call.arguments_string(), "{not json");

        let call = ToolCall {
            arguments: serde_json::json!({"q": "rust"}),
            ..call
        };
        assert_eq!(call.arguments_string(), r#"{"q":"rust"}"#);
    }
}
