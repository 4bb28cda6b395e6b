use serde::Serialize;

use super::{NativeSearch, SchemaLimits, SelectedTool, ToolSchemaConverter, prepare_function, schema, select_tools};
use crate::error::LlmError;
use crate::protocol::google::{GoogleFunctionDeclaration, GoogleSearch, GoogleTool};
use crate::types::{GenericTool, Vendor};

/// Ids that always name Google Search grounding
const GOOGLE_SEARCH_IDS: &[&str] = &["google_search", "googleSearch", "google_search_retrieval", "gemini_web_search"];

/// One converted tool, before grouping into the request's `tools` array
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GoogleToolEntry {
    /// Client-side function
    Function(GoogleFunctionDeclaration),
    /// Google Search grounding
    GoogleSearch,
}

/// Group converted entries into wire tools
///
/// All function declarations share one tool object; search grounding gets its
/// own, after the functions.
pub fn into_wire_tools(entries: Vec<GoogleToolEntry>) -> Vec<GoogleTool> {
    let mut declarations = Vec::new();
    let mut search = false;
    for entry in entries {
        match entry {
            GoogleToolEntry::Function(decl) => declarations.push(decl),
            GoogleToolEntry::GoogleSearch => search = true,
        }
    }

    let mut tools = Vec::with_capacity(2);
    if !declarations.is_empty() {
        tools.push(GoogleTool {
            function_declarations: Some(declarations),
            ..GoogleTool::default()
        });
    }
    if search {
        tools.push(GoogleTool {
            google_search: Some(GoogleSearch {}),
            ..GoogleTool::default()
        });
    }
    tools
}

/// Google tools: `additionalProperties` is rejected by the validator
#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleToolConverter;

impl ToolSchemaConverter for GoogleToolConverter {
    type Tool = GoogleToolEntry;

    fn vendor(&self) -> Vendor {
        Vendor::Google
    }

    fn convert(&self, tools: &[GenericTool]) -> Result<Vec<GoogleToolEntry>, LlmError> {
        let native = NativeSearch {
            ids: GOOGLE_SEARCH_IDS,
            supported: true,
        };

        select_tools(self.vendor(), native, tools)
            .into_iter()
            .map(|selected| match selected {
                SelectedTool::NativeSearch(_) => Ok(GoogleToolEntry::GoogleSearch),
                SelectedTool::Function(tool) => {
                    let prepared = prepare_function(self.vendor(), tool, SchemaLimits::LENIENT)?;
                    Ok(GoogleToolEntry::Function(GoogleFunctionDeclaration {
                        name: prepared.name,
                        description: prepared.description,
                        parameters: schema::strip_additional_properties(&prepared.parameters),
                    }))
                }
            })
            .collect()
    }
}
