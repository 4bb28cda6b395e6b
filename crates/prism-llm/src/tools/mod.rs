//! Generic tool declarations to vendor tool schemas
//!
//! Each vendor family has one [`ToolSchemaConverter`]. They share tool
//! selection (provider filtering and web-search de-duplication) and the
//! per-function checks in [`prepare_function`]; only the final shape and
//! schema rewriting differ.

pub mod anthropic;
pub mod google;
pub mod openai;
pub mod schema;

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Value, json};

pub use anthropic::AnthropicToolConverter;
pub use google::{GoogleToolConverter, GoogleToolEntry, into_wire_tools};
pub use openai::{OpenAiChatToolConverter, OpenAiResponsesToolConverter};
pub use schema::SchemaLimits;

use crate::error::LlmError;
use crate::types::{GenericTool, Vendor};

/// Converts generic tool declarations into one vendor's tool list
pub trait ToolSchemaConverter: Send + Sync {
    /// Vendor-shaped tool entry
    type Tool: Serialize;

    /// Vendor family this converter targets
    fn vendor(&self) -> Vendor;

    /// Convert the tools the vendor should see, in input order
    fn convert(&self, tools: &[GenericTool]) -> Result<Vec<Self::Tool>, LlmError>;
}

/// A tool that survived selection
#[derive(Debug, Clone, Copy)]
pub enum SelectedTool<'a> {
    /// The vendor's own search capability
    NativeSearch(&'a GenericTool),
    /// A client-side function
    Function(&'a GenericTool),
}

/// How a vendor exposes native web search
#[derive(Debug, Clone, Copy)]
pub struct NativeSearch {
    /// Tool ids that always mean "this vendor's search"
    pub ids: &'static [&'static str],
    /// Whether the vendor API can express native search at all
    pub supported: bool,
}

impl NativeSearch {
    fn matches(&self, vendor: Vendor, tool: &GenericTool) -> bool {
        if !tool.is_special_tool {
            return false;
        }
        let tagged_for_vendor = tool.provider.as_deref().is_some_and(|tag| vendor.owns_provider_tag(tag));
        self.ids.contains(&tool.wire_name()) || (tool.is_web_search() && tagged_for_vendor)
    }
}

/// Pick the tools a vendor should receive
///
/// Tools tagged for another vendor are dropped. When the vendor's own search
/// capability is present (and expressible), every other web-search tool is
/// dropped and only the first native entry is kept. Order is preserved.
pub fn select_tools<'a>(vendor: Vendor, native: NativeSearch, tools: &'a [GenericTool]) -> Vec<SelectedTool<'a>> {
    let for_vendor = |tool: &GenericTool| tool.provider.as_deref().is_none_or(|tag| vendor.owns_provider_tag(tag));
    let native_present = native.supported && tools.iter().any(|t| for_vendor(t) && native.matches(vendor, t));

    let mut selected = Vec::with_capacity(tools.len());
    let mut native_emitted = false;

    for tool in tools {
        if !for_vendor(tool) {
            tracing::debug!(vendor = %vendor, tool = %tool.wire_name(), "dropping tool tagged for another vendor");
            continue;
        }

        if native.matches(vendor, tool) {
            if !native.supported {
                tracing::debug!(vendor = %vendor, tool = %tool.wire_name(), "vendor has no native search tool, dropping");
            } else if !native_emitted {
                selected.push(SelectedTool::NativeSearch(tool));
                native_emitted = true;
            }
            continue;
        }

        if native_present && tool.is_web_search() {
            tracing::debug!(vendor = %vendor, tool = %tool.wire_name(), "native search present, dropping generic search tool");
            continue;
        }

        selected.push(SelectedTool::Function(tool));
    }

    selected
}

fn tool_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,128}$").expect("must be valid regex"))
}

/// Whether a name is acceptable to every vendor
pub fn is_valid_tool_name(name: &str) -> bool {
    tool_name_pattern().is_match(name)
}

/// Function tool after the vendor-independent checks
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedFunction {
    /// Outbound machine name
    pub name: String,
    /// Description, omitted when empty
    pub description: Option<String>,
    /// Parameter schema, never null
    pub parameters: Value,
}

/// Validate one function tool and normalize its schema
///
/// Checks the outbound name, refuses parameter schemas that are already a
/// vendor tool definition, substitutes an empty object schema for a missing
/// one and enforces the size limits.
pub fn prepare_function(vendor: Vendor, tool: &GenericTool, limits: SchemaLimits) -> Result<PreparedFunction, LlmError> {
    let name = tool.wire_name();
    if !is_valid_tool_name(name) {
        return Err(LlmError::schema(
            vendor,
            name,
            "tool name must match ^[A-Za-z0-9_-]{1,128}$",
        ));
    }

    let parameters = match &tool.parameters {
        Value::Null => json!({"type": "object", "properties": {}}),
        Value::Object(_) => tool.parameters.clone(),
        _ => return Err(LlmError::schema(vendor, name, "parameters must be a JSON Schema object")),
    };

    if let Some(wrapper) = schema::vendor_wrapper(&parameters) {
        return Err(LlmError::schema(
            vendor,
            name,
            format!("parameters are already {wrapper}"),
        ));
    }

    schema::check_limits(&parameters, limits).map_err(|reason| LlmError::schema(vendor, name, reason))?;

    Ok(PreparedFunction {
        name: name.to_owned(),
        description: (!tool.description.is_empty()).then(|| tool.description.clone()),
        parameters,
    })
}
