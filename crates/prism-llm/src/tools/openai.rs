use super::{NativeSearch, SchemaLimits, SelectedTool, ToolSchemaConverter, prepare_function, schema, select_tools};
use crate::error::LlmError;
use crate::protocol::openai::{OpenAiFunction, OpenAiTool};
use crate::protocol::openai_responses::ResponsesTool;
use crate::types::{GenericTool, Vendor};

/// Ids that always name `OpenAI`'s hosted web search
const OPENAI_SEARCH_IDS: &[&str] = &["web_search", "web_search_preview", "openai_web_search"];

/// Chat Completions tools: plain function declarations
///
/// Chat Completions cannot express hosted search, so native search tools are
/// dropped and generic search functions are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiChatToolConverter;

impl ToolSchemaConverter for OpenAiChatToolConverter {
    type Tool = OpenAiTool;

    fn vendor(&self) -> Vendor {
        Vendor::OpenAiChat
    }

    fn convert(&self, tools: &[GenericTool]) -> Result<Vec<OpenAiTool>, LlmError> {
        let native = NativeSearch {
            ids: OPENAI_SEARCH_IDS,
            supported: false,
        };

        select_tools(self.vendor(), native, tools)
            .into_iter()
            .filter_map(|selected| match selected {
                SelectedTool::Function(tool) => Some(tool),
                SelectedTool::NativeSearch(_) => None,
            })
            .map(|tool| {
                let prepared = prepare_function(self.vendor(), tool, SchemaLimits::LENIENT)?;
                Ok(OpenAiTool {
                    tool_type: "function".to_owned(),
                    function: OpenAiFunction {
                        name: prepared.name,
                        description: prepared.description,
                        parameters: prepared.parameters,
                    },
                })
            })
            .collect()
    }
}

/// Responses API tools, strict by default
#[derive(Debug, Clone, Copy)]
pub struct OpenAiResponsesToolConverter {
    strict: bool,
}

impl OpenAiResponsesToolConverter {
    pub const fn new(strict: bool) -> Self {
        Self { strict }
    }
}

impl Default for OpenAiResponsesToolConverter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ToolSchemaConverter for OpenAiResponsesToolConverter {
    type Tool = ResponsesTool;

    fn vendor(&self) -> Vendor {
        Vendor::OpenAiResponses
    }

    fn convert(&self, tools: &[GenericTool]) -> Result<Vec<ResponsesTool>, LlmError> {
        let native = NativeSearch {
            ids: OPENAI_SEARCH_IDS,
            supported: true,
        };
        let limits = if self.strict {
            SchemaLimits::STRICT
        } else {
            SchemaLimits::LENIENT
        };

        select_tools(self.vendor(), native, tools)
            .into_iter()
            .map(|selected| match selected {
                SelectedTool::NativeSearch(_) => Ok(ResponsesTool::WebSearchPreview),
                SelectedTool::Function(tool) => {
                    let prepared = prepare_function(self.vendor(), tool, limits)?;
                    let parameters = if self.strict {
                        schema::enforce_strict(&prepared.parameters)
                    } else {
                        prepared.parameters
                    };
                    Ok(ResponsesTool::Function {
                        name: prepared.name,
                        description: prepared.description,
                        parameters,
                        strict: self.strict,
                    })
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::tools::is_valid_tool_name;
    use crate::tools::tests::{plain_tool, search_tool};

    fn get_weather() -> GenericTool {
        GenericTool::function(
            "get_weather",
            "Current weather for a city",
            json!({
                "type": "object",
                "properties": {
                    "city": {"type": "string"},
                    "unit": {"type": "string", "enum": ["celsius", "fahrenheit"]}
                },
                "required": ["city"]
            }),
        )
    }

    #[test]
    fn get_weather_becomes_strict_for_responses() {
        let tools = OpenAiResponsesToolConverter::default().convert(&[get_weather()]).unwrap();
        let value = serde_json::to_value(&tools).unwrap();

        assert_eq!(
            value,
            json!([{
                "type": "function",
                "name": "get_weather",
                "description": "Current weather for a city",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "city": {"type": "string"},
                        "unit": {"type": "string", "enum": ["celsius", "fahrenheit"]}
                    },
                    "required": ["city", "unit"],
                    "additionalProperties": false
                },
                "strict": true
            }])
        );
    }

    #[test]
    fn converting_already_strict_tool_is_stable() {
        let converter = OpenAiResponsesToolConverter::default();
        let first = converter.convert(&[get_weather()]).unwrap();
        let ResponsesTool::Function { parameters, .. } = &first[0] else {
            panic!("expected a function tool");
        };

        let again = GenericTool::function("get_weather", "Current weather for a city", parameters.clone());
        let second = converter.convert(&[again]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn responses_native_search_dedups_generic_search() {
        let tools = vec![
            search_tool("brave_search", None, false),
            search_tool("exa_search", None, false),
            search_tool("web_search_preview", None, true),
            plain_tool("calculator"),
            plain_tool("translator"),
        ];
        let converted = OpenAiResponsesToolConverter::default().convert(&tools).unwrap();

        assert_eq!(converted.len(), 3);
        assert_eq!(serde_json::to_value(&converted[0]).unwrap(), json!({"type": "web_search_preview"}));
    }

    #[test]
    fn chat_keeps_generic_search_and_drops_native() {
        let tools = vec![
            search_tool("brave_search", None, false),
            search_tool("web_search_preview", Some("openai"), true),
            plain_tool("calculator"),
        ];
        let converted = OpenAiChatToolConverter.convert(&tools).unwrap();
        let names: Vec<_> = converted.iter().map(|t| t.function.name.as_str()).collect();
        assert_eq!(names, vec!["brave_search", "calculator"]);
        assert!(names.iter().all(|n| is_valid_tool_name(n)));
    }

    #[test]
    fn chat_tools_are_not_rewritten() {
        let converted = OpenAiChatToolConverter.convert(&[get_weather()]).unwrap();
        assert_eq!(converted[0].function.parameters, get_weather().parameters);
        assert_eq!(converted[0].tool_type, "function");
    }

    #[test]
    fn strict_mode_enforces_depth_limit() {
        let mut schema = json!({"type": "string"});
        for _ in 0..11 {
            schema = json!({"type": "object", "properties": {"next": schema}});
        }
        let deep = GenericTool::function("deep", "", schema);

        let err = OpenAiResponsesToolConverter::default().convert(std::slice::from_ref(&deep)).unwrap_err();
        assert!(matches!(err, LlmError::SchemaConversion { ref tool, .. } if tool == "deep"));
        assert!(OpenAiResponsesToolConverter::new(false).convert(&[deep]).is_ok());
    }
}
