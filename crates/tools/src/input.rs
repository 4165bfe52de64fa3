//! Shared schema and argument plumbing for the built-in tools.
//!
//! Every built-in tool takes a single `input` object described by a named
//! definition, so `add` declares
//!
//! ```json
//! { "type": "object",
//!   "properties": { "input": { "$ref": "#/$defs/AddInput" } },
//!   "$defs": { "AddInput": { "type": "object", "properties": { "a": .., "b": .. } } } }
//! ```
//!
//! and receives `{"input": {"a": 5, "b": 3}}`.

use ironloop_core::error::ToolError;
use ironloop_core::tool::ToolResult;
use serde_json::{Map, Value, json};

/// Field types used by the built-in tools.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Field {
    Int,
    Float,
    Str,
    IntList,
}

impl Field {
    fn schema(self) -> Value {
        match self {
            Self::Int => json!({ "type": "integer" }),
            Self::Float => json!({ "type": "number" }),
            Self::Str => json!({ "type": "string" }),
            Self::IntList => json!({ "type": "array", "items": { "type": "integer" } }),
        }
    }
}

/// Build a root schema with one `input` property referencing `def_name`.
pub(crate) fn input_schema(def_name: &str, fields: &[(&str, Field)]) -> Value {
    let mut properties = Map::new();
    for (name, field) in fields {
        properties.insert((*name).to_string(), field.schema());
    }
    let required: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();

    let mut defs = Map::new();
    defs.insert(
        def_name.to_string(),
        json!({
            "type": "object",
            "title": def_name,
            "properties": properties,
            "required": required
        }),
    );

    json!({
        "type": "object",
        "properties": {
            "input": { "$ref": format!("#/$defs/{def_name}") }
        },
        "required": ["input"],
        "$defs": defs
    })
}

/// Typed access to the bound `input` object.
pub(crate) struct Input<'a> {
    tool: &'a str,
    fields: &'a Map<String, Value>,
}

impl<'a> Input<'a> {
    pub(crate) fn from_arguments(tool: &'a str, arguments: &'a Value) -> Result<Self, ToolError> {
        let fields = arguments
            .get("input")
            .and_then(Value::as_object)
            .ok_or_else(|| {
                ToolError::InvalidArguments(format!("{tool}: missing 'input' object"))
            })?;
        Ok(Self { tool, fields })
    }

    fn field(&self, name: &str) -> Result<&'a Value, ToolError> {
        self.fields.get(name).ok_or_else(|| {
            ToolError::InvalidArguments(format!("{}: missing '{name}'", self.tool))
        })
    }

    fn invalid(&self, name: &str, expected: &str) -> ToolError {
        ToolError::InvalidArguments(format!("{}: '{name}' must be {expected}", self.tool))
    }

    pub(crate) fn int(&self, name: &str) -> Result<i64, ToolError> {
        self.field(name)?
            .as_i64()
            .ok_or_else(|| self.invalid(name, "an integer"))
    }

    pub(crate) fn float(&self, name: &str) -> Result<f64, ToolError> {
        self.field(name)?
            .as_f64()
            .ok_or_else(|| self.invalid(name, "a number"))
    }

    pub(crate) fn string(&self, name: &str) -> Result<&'a str, ToolError> {
        self.field(name)?
            .as_str()
            .ok_or_else(|| self.invalid(name, "a string"))
    }

    pub(crate) fn int_list(&self, name: &str) -> Result<Vec<i64>, ToolError> {
        self.field(name)?
            .as_array()
            .ok_or_else(|| self.invalid(name, "a list of integers"))?
            .iter()
            .map(|v| v.as_i64().ok_or_else(|| self.invalid(name, "a list of integers")))
            .collect()
    }
}

/// Render an integer result.
pub(crate) fn int_result(value: i64) -> ToolResult {
    ToolResult::ok(value.to_string()).with_data(json!({ "result": value }))
}

/// Render a float result, rejecting NaN and infinities.
pub(crate) fn float_result(value: f64) -> ToolResult {
    match serde_json::Number::from_f64(value) {
        Some(number) => {
            ToolResult::ok(number.to_string()).with_data(json!({ "result": number }))
        }
        None => ToolResult::failed(format!("Result is not a finite number: {value}")),
    }
}

/// Render a list result.
pub(crate) fn list_result(values: Vec<i64>) -> ToolResult {
    let value = json!(values);
    ToolResult::ok(value.to_string()).with_data(json!({ "result": value }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_schema_shape() {
        let schema = input_schema("AddInput", &[("a", Field::Int), ("b", Field::Int)]);
        assert_eq!(schema["properties"]["input"]["$ref"], "#/$defs/AddInput");
        let def = &schema["$defs"]["AddInput"];
        let names: Vec<&String> = def["properties"].as_object().unwrap().keys().collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn input_accessors() {
        let args = json!({ "input": { "a": 5, "x": 1.5, "s": "hi", "l": [1, 2] } });
        let input = Input::from_arguments("t", &args).unwrap();
        assert_eq!(input.int("a").unwrap(), 5);
        assert_eq!(input.float("x").unwrap(), 1.5);
        assert_eq!(input.float("a").unwrap(), 5.0);
        assert_eq!(input.string("s").unwrap(), "hi");
        assert_eq!(input.int_list("l").unwrap(), vec![1, 2]);
        assert!(input.int("s").is_err());
        assert!(input.int("missing").is_err());
    }

    #[test]
    fn missing_input_object_rejected() {
        let args = json!({ "a": 5 });
        assert!(Input::from_arguments("t", &args).is_err());
    }

    #[test]
    fn float_rendering() {
        assert_eq!(float_result(2.5).output, "2.5");
        assert_eq!(float_result(5.0).output, "5.0");
        assert!(!float_result(f64::INFINITY).success);
    }

    #[test]
    fn list_rendering() {
        assert_eq!(list_result(vec![73, 78]).output, "[73,78]");
    }
}
