use serde::{Deserialize, Serialize};

/// What a tool does, as far as vendor conversion cares
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Ordinary function tool
    #[default]
    Function,
    /// Web search, either a vendor-native capability or a generic search tool
    WebSearch,
}

/// Tool declaration offered to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericTool {
    /// Stable machine identifier, sent to vendors as the function name
    #[serde(default)]
    pub id: String,
    /// Display name, possibly localized; only used when `id` is empty
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// JSON Schema for the arguments
    #[serde(default)]
    pub parameters: serde_json::Value,
    /// Vendor affinity tag (e.g. "openai", "anthropic", "google")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Vendor-implemented capability rather than a client-side function
    #[serde(default)]
    pub is_special_tool: bool,
    /// Tool category
    #[serde(default)]
    pub kind: ToolKind,
}

impl GenericTool {
    /// Function tool with an identifier and a parameter schema
    pub fn function(id: impl Into<String>, description: impl Into<String>, parameters: serde_json::Value) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: description.into(),
            parameters,
            provider: None,
            is_special_tool: false,
            kind: ToolKind::Function,
        }
    }

    /// Identifier sent to the vendor: `id` when set, `name` otherwise
    pub fn wire_name(&self) -> &str {
        if self.id.is_empty() { &self.name } else { &self.id }
    }

    /// Whether the tool is a web search of any origin
    pub fn is_web_search(&self) -> bool {
        self.kind == ToolKind::WebSearch
    }
}
