//! Pure JSON Schema rewrites required by vendor validators
//!
//! Every transform takes the caller's schema by reference and returns a new
//! tree; the input is never mutated.

use serde_json::{Map, Value};

/// Keywords whose value maps names to subschemas
const SCHEMA_MAP_KEYWORDS: &[&str] = &["properties", "patternProperties", "$defs", "definitions"];

/// Keywords whose value is a subschema or, for `items`, possibly a tuple of them
const SCHEMA_KEYWORDS: &[&str] = &["items", "additionalItems", "contains", "not", "if", "then", "else"];

/// Keywords whose value is a list of subschemas
const SCHEMA_LIST_KEYWORDS: &[&str] = &["anyOf", "oneOf", "allOf", "prefixItems"];

/// Size limits a converted schema must respect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaLimits {
    /// Maximum nesting of object and array schemas, an object root counting as 1
    pub max_depth: usize,
    /// Maximum number of declared properties across all levels
    pub max_properties: usize,
}

impl SchemaLimits {
    /// Limits for vendors without a documented bound
    pub const LENIENT: Self = Self {
        max_depth: 32,
        max_properties: 10_000,
    };

    /// `OpenAI` structured-output limits
    pub const STRICT: Self = Self {
        max_depth: 10,
        max_properties: 5_000,
    };
}

/// Shape statistics of a schema tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaStats {
    pub depth: usize,
    pub properties: usize,
}

/// Visit every subschema object, parents before children
fn walk_mut(schema: &mut Value, visit: &mut dyn FnMut(&mut Map<String, Value>)) {
    let Value::Object(obj) = schema else {
        return;
    };

    visit(obj);

    for keyword in SCHEMA_MAP_KEYWORDS {
        if let Some(Value::Object(children)) = obj.get_mut(*keyword) {
            for child in children.values_mut() {
                walk_mut(child, visit);
            }
        }
    }
    for keyword in SCHEMA_KEYWORDS {
        match obj.get_mut(*keyword) {
            Some(Value::Array(children)) => children.iter_mut().for_each(|child| walk_mut(child, visit)),
            Some(child) => walk_mut(child, visit),
            None => {}
        }
    }
    for keyword in SCHEMA_LIST_KEYWORDS {
        if let Some(Value::Array(children)) = obj.get_mut(*keyword) {
            children.iter_mut().for_each(|child| walk_mut(child, visit));
        }
    }
}

/// Read-only walk carrying the container nesting depth of each subschema
///
/// Only object and array schemas open a level; scalar leaves and combinator
/// wrappers inherit their parent's depth.
fn walk(schema: &Value, parent_depth: usize, visit: &mut dyn FnMut(&Map<String, Value>, usize)) {
    let Value::Object(obj) = schema else {
        return;
    };

    let depth = parent_depth + usize::from(is_object_schema(obj) || is_array_schema(obj));
    visit(obj, depth);

    for keyword in SCHEMA_MAP_KEYWORDS {
        if let Some(Value::Object(children)) = obj.get(*keyword) {
            children.values().for_each(|child| walk(child, depth, visit));
        }
    }
    for keyword in SCHEMA_KEYWORDS {
        match obj.get(*keyword) {
            Some(Value::Array(children)) => children.iter().for_each(|child| walk(child, depth, visit)),
            Some(child) => walk(child, depth, visit),
            None => {}
        }
    }
    for keyword in SCHEMA_LIST_KEYWORDS {
        if let Some(Value::Array(children)) = obj.get(*keyword) {
            children.iter().for_each(|child| walk(child, depth, visit));
        }
    }
}

/// Whether a schema object describes a JSON array
fn is_array_schema(obj: &Map<String, Value>) -> bool {
    match obj.get("type") {
        Some(Value::String(t)) => t == "array",
        Some(Value::Array(types)) => types.iter().any(|t| t == "array"),
        _ => obj.contains_key("items"),
    }
}

/// Whether a schema object describes a JSON object
fn is_object_schema(obj: &Map<String, Value>) -> bool {
    match obj.get("type") {
        Some(Value::String(t)) => t == "object",
        Some(Value::Array(types)) => types.iter().any(|t| t == "object"),
        _ => obj.contains_key("properties"),
    }
}

/// Measure nesting depth and total declared properties
pub fn measure(schema: &Value) -> SchemaStats {
    let mut stats = SchemaStats::default();
    walk(schema, 0, &mut |obj, depth| {
        stats.depth = stats.depth.max(depth);
        if let Some(Value::Object(props)) = obj.get("properties") {
            stats.properties += props.len();
        }
    });
    stats
}

/// Check a schema against size limits, describing the first violation
pub fn check_limits(schema: &Value, limits: SchemaLimits) -> Result<(), String> {
    let stats = measure(schema);
    if stats.depth > limits.max_depth {
        return Err(format!(
            "schema nests {} levels deep, limit is {}",
            stats.depth, limits.max_depth
        ));
    }
    if stats.properties > limits.max_properties {
        return Err(format!(
            "schema declares {} properties, limit is {}",
            stats.properties, limits.max_properties
        ));
    }
    Ok(())
}

/// Remove `additionalProperties` from every level of the schema
pub fn strip_additional_properties(schema: &Value) -> Value {
    let mut copy = schema.clone();
    walk_mut(&mut copy, &mut |obj| {
        obj.remove("additionalProperties");
    });
    copy
}

/// Rewrite a schema for strict structured-output validation
///
/// Every object level lists all of its declared properties as required and
/// forbids undeclared ones. Existing `required` entries keep their order and
/// missing names follow in declaration order. Applying it twice is a no-op.
pub fn enforce_strict(schema: &Value) -> Value {
    let mut copy = schema.clone();
    walk_mut(&mut copy, &mut |obj| {
        if !is_object_schema(obj) {
            return;
        }

        let declared: Vec<String> = obj
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default();

        let mut required: Vec<Value> = obj
            .get("required")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for name in declared {
            if !required.iter().any(|r| r.as_str() == Some(name.as_str())) {
                required.push(Value::String(name));
            }
        }

        obj.insert("required".to_owned(), Value::Array(required));
        obj.insert("additionalProperties".to_owned(), Value::Bool(false));
    });
    copy
}

/// Whether every object level already satisfies strict validation
pub fn is_strict(schema: &Value) -> bool {
    let mut strict = true;
    walk(schema, 0, &mut |obj, _| {
        if !is_object_schema(obj) {
            return;
        }
        if obj.get("additionalProperties") != Some(&Value::Bool(false)) {
            strict = false;
        }
        let required = obj.get("required").and_then(Value::as_array);
        if let Some(Value::Object(props)) = obj.get("properties") {
            let all_listed = props
                .keys()
                .all(|name| required.is_some_and(|r| r.iter().any(|v| v.as_str() == Some(name.as_str()))));
            strict &= all_listed;
        }
    });
    strict
}

/// Whether any level of the schema still carries `additionalProperties`
pub fn has_additional_properties(schema: &Value) -> bool {
    let mut found = false;
    walk(schema, 0, &mut |obj, _| found |= obj.contains_key("additionalProperties"));
    found
}

/// Detect a parameter schema that is already a vendor tool definition
///
/// Returns a description of the wrapper that was found.
pub fn vendor_wrapper(parameters: &Value) -> Option<&'static str> {
    let obj = parameters.as_object()?;
    if obj.get("type").and_then(Value::as_str) == Some("function") {
        return Some("an OpenAI function tool definition");
    }
    if obj.contains_key("input_schema") {
        return Some("an Anthropic tool definition");
    }
    if obj.contains_key("functionDeclarations") || obj.contains_key("function_declarations") {
        return Some("a Google tool declaration");
    }
    None
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn nested_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string"},
                "filters": {
                    "type": "object",
                    "properties": {
                        "site": {"type": "string"},
                        "after": {"type": "string"}
                    },
                    "required": ["site"],
                    "additionalProperties": true
                },
                "tags": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {"label": {"type": "string"}}
                    }
                }
            },
            "required": ["query"]
        })
    }

    #[test]
    fn strict_requires_every_property_at_every_level() {
        let strict = enforce_strict(&nested_schema());

        assert_eq!(strict["additionalProperties"], false);
        assert_eq!(strict["required"], json!(["query", "filters", "tags"]));
        assert_eq!(strict["properties"]["filters"]["required"], json!(["site", "after"]));
        assert_eq!(strict["properties"]["filters"]["additionalProperties"], false);
        assert_eq!(strict["properties"]["tags"]["items"]["required"], json!(["label"]));
        assert_eq!(strict["properties"]["tags"]["items"]["additionalProperties"], false);
        assert!(is_strict(&strict));
    }

    #[test]
    fn strict_leaves_scalar_schemas_alone() {
        let strict = enforce_strict(&nested_schema());
        assert!(strict["properties"]["query"].get("required").is_none());
        assert!(strict["properties"]["query"].get("additionalProperties").is_none());
        assert!(strict["properties"]["tags"].get("additionalProperties").is_none());
    }

    #[test]
    fn strict_is_idempotent() {
        let once = enforce_strict(&nested_schema());
        let twice = enforce_strict(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn strict_reaches_composition_branches_and_definitions() {
        let schema = json!({
            "type": "object",
            "properties": {
                "target": {
                    "anyOf": [
                        {"type": "object", "properties": {"url": {"type": "string"}}},
                        {"$ref": "#/$defs/file"}
                    ]
                }
            },
            "$defs": {
                "file": {"type": "object", "properties": {"path": {"type": "string"}}}
            }
        });

        let strict = enforce_strict(&schema);
        assert_eq!(strict["properties"]["target"]["anyOf"][0]["required"], json!(["url"]));
        assert_eq!(strict["$defs"]["file"]["additionalProperties"], false);
        assert!(is_strict(&strict));
    }

    #[test]
    fn strict_does_not_mutate_input() {
        let original = nested_schema();
        let before = original.clone();
        let _ = enforce_strict(&original);
        assert_eq!(original, before);
    }

    #[test]
    fn strip_removes_additional_properties_everywhere() {
        let schema = json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "additionalProperties": {"type": "string"},
                "nested": {
                    "type": "object",
                    "additionalProperties": {"type": "number"},
                    "properties": {
                        "deep": {
                            "type": "array",
                            "items": {"type": "object", "additionalProperties": false}
                        }
                    }
                }
            }
        });

        let stripped = strip_additional_properties(&schema);
        assert!(!has_additional_properties(&stripped));
        // A property that happens to be named additionalProperties is data, not a keyword
        assert_eq!(stripped["properties"]["additionalProperties"], json!({"type": "string"}));
        // Input untouched
        assert_eq!(schema["additionalProperties"], false);
        assert!(has_additional_properties(&schema));
    }

    #[test]
    fn measure_counts_depth_and_properties() {
        let stats = measure(&nested_schema());
        assert_eq!(stats.properties, 6);
        // object -> tags array -> item object; the scalar `label` adds no level
        assert_eq!(stats.depth, 3);
    }

    #[test]
    fn depth_counts_only_containers() {
        assert_eq!(measure(&json!({"type": "string"})).depth, 0);
        assert_eq!(measure(&json!({"type": "object", "properties": {"a": {"type": "integer"}}})).depth, 1);

        let wrapped = json!({
            "type": "object",
            "properties": {
                "choice": {"anyOf": [{"type": "string"}, {"type": "array", "items": {"type": "number"}}]}
            }
        });
        assert_eq!(measure(&wrapped).depth, 2);
    }

    #[test]
    fn strict_limit_allows_ten_object_levels() {
        let mut schema = json!({"type": "string"});
        for _ in 0..10 {
            schema = json!({"type": "object", "properties": {"inner": schema}});
        }
        assert_eq!(measure(&schema).depth, 10);
        assert!(check_limits(&schema, SchemaLimits::STRICT).is_ok());

        let deeper = json!({"type": "object", "properties": {"outer": schema}});
        assert!(check_limits(&deeper, SchemaLimits::STRICT).is_err());
    }

    #[test]
    fn limits_reject_deep_schemas() {
        let mut schema = json!({"type": "string"});
        for _ in 0..12 {
            schema = json!({"type": "object", "properties": {"inner": schema}});
        }
        let err = check_limits(&schema, SchemaLimits::STRICT).unwrap_err();
        assert!(err.contains("levels deep"));
        assert!(check_limits(&schema, SchemaLimits::LENIENT).is_ok());
    }

    #[test]
    fn detects_vendor_wrappers() {
        assert!(vendor_wrapper(&json!({"type": "function", "function": {"name": "x"}})).is_some());
        assert!(vendor_wrapper(&json!({"name": "x", "input_schema": {}})).is_some());
        assert!(vendor_wrapper(&json!({"functionDeclarations": []})).is_some());
        assert!(vendor_wrapper(&nested_schema()).is_none());
    }
}
