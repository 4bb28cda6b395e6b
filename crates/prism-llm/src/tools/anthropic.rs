use super::{NativeSearch, SchemaLimits, SelectedTool, ToolSchemaConverter, prepare_function, select_tools};
use crate::error::LlmError;
use crate::protocol::anthropic::{AnthropicCustomTool, AnthropicServerTool, AnthropicTool};
use crate::types::{GenericTool, Vendor};

/// Versioned type of Anthropic's hosted web search
pub const WEB_SEARCH_TOOL_TYPE: &str = "web_search_20250305";

/// Ids that always name Anthropic's hosted web search
const ANTHROPIC_SEARCH_IDS: &[&str] = &["web_search", WEB_SEARCH_TOOL_TYPE, "anthropic_web_search"];

/// Anthropic tools: schemas pass through untouched, only names are checked
#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicToolConverter;

impl ToolSchemaConverter for AnthropicToolConverter {
    type Tool = AnthropicTool;

    fn vendor(&self) -> Vendor {
        Vendor::Anthropic
    }

    fn convert(&self, tools: &[GenericTool]) -> Result<Vec<AnthropicTool>, LlmError> {
        let native = NativeSearch {
            ids: ANTHROPIC_SEARCH_IDS,
            supported: true,
        };

        select_tools(self.vendor(), native, tools)
            .into_iter()
            .map(|selected| match selected {
                SelectedTool::NativeSearch(_) => Ok(AnthropicTool::Server(AnthropicServerTool {
                    tool_type: WEB_SEARCH_TOOL_TYPE.to_owned(),
                    name: "web_search".to_owned(),
                })),
                SelectedTool::Function(tool) => {
                    let prepared = prepare_function(self.vendor(), tool, SchemaLimits::LENIENT)?;
                    Ok(AnthropicTool::Custom(AnthropicCustomTool {
                        name: prepared.name,
                        description: prepared.description,
                        input_schema: prepared.parameters,
                    }))
                }
            })
            .collect()
    }
}
