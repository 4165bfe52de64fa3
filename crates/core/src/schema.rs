//! Tool parameter schemas.
//!
//! Tools describe their parameters as JSON Schema. The catalog converts each
//! one into a [`ToolSchema`] exactly once, at load time: a typed
//! [`SchemaNode`] tree plus the named definitions its `$ref`s point at.
//! Every reference is resolved and checked for cycles before the schema is
//! accepted, so argument binding never meets a dangling or recursive reference.
//!
//! Supported JSON Schema subset:
//! - `type`: `integer`, `number`, `string`, `array` (with `items`), `object`
//!   (with `properties`, in declaration order)
//! - `$ref: "#/$defs/<Name>"` (or `#/definitions/<Name>`) against the sibling
//!   `$defs` map
//!
//! Any other leaf type (or a missing `type`) is treated as a string.

use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// The leaf kinds a raw textual parameter can be coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Integer,
    Number,
    String,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::Integer => write!(f, "integer"),
            ScalarKind::Number => write!(f, "number"),
            ScalarKind::String => write!(f, "string"),
        }
    }
}

/// One node of a parameter schema tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Integer,
    Number,
    String,
    /// A list; the element must resolve to a scalar kind.
    Array(Box<SchemaNode>),
    /// Named fields in declaration order.
    Object(Vec<(String, SchemaNode)>),
    /// A named definition from the schema's `$defs`.
    Reference(String),
}

impl SchemaNode {
    /// The scalar kind of this node, if it is a leaf.
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            SchemaNode::Integer => Some(ScalarKind::Integer),
            SchemaNode::Number => Some(ScalarKind::Number),
            SchemaNode::String => Some(ScalarKind::String),
            _ => None,
        }
    }
}

const MAX_SUMMARY_PARAMS: usize = 32;

/// A validated schema: root node plus the definitions its references use.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSchema {
    root: SchemaNode,
    defs: BTreeMap<String, SchemaNode>,
}

impl ToolSchema {
    /// Build a schema from parts, rejecting unresolved or cyclic references.
    pub fn new(
        root: SchemaNode,
        defs: BTreeMap<String, SchemaNode>,
    ) -> Result<Self, SchemaError> {
        let schema = Self { root, defs };
        schema.validate()?;
        Ok(schema)
    }

    /// A schema with no parameters.
    pub fn empty() -> Self {
        Self {
            root: SchemaNode::Object(Vec::new()),
            defs: BTreeMap::new(),
        }
    }

    /// Convert a JSON Schema document into a validated [`ToolSchema`].
    pub fn from_json(value: &Value) -> Result<Self, SchemaError> {
        let mut defs = BTreeMap::new();
        for key in ["$defs", "definitions"] {
            let Some(raw) = value.get(key) else {
                continue;
            };
            let map = raw
                .as_object()
                .ok_or_else(|| SchemaError::Invalid(format!("'{key}' must be an object")))?;
            for (name, def) in map {
                defs.insert(name.clone(), parse_node(def)?);
            }
        }

        let root = parse_node(value)?;
        Self::new(root, defs)
    }

    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    pub fn defs(&self) -> &BTreeMap<String, SchemaNode> {
        &self.defs
    }

    /// Follow `Reference` nodes until a concrete shape is reached.
    pub fn resolve<'a>(&'a self, node: &'a SchemaNode) -> Result<&'a SchemaNode, SchemaError> {
        let mut current = node;
        let mut hops = 0usize;
        while let SchemaNode::Reference(name) = current {
            if hops > self.defs.len() {
                return Err(SchemaError::CyclicReference { name: name.clone() });
            }
            current = self
                .defs
                .get(name)
                .ok_or_else(|| SchemaError::UnresolvedReference { name: name.clone() })?;
            hops += 1;
        }
        Ok(current)
    }

    /// The scalar kind an array's elements coerce into.
    pub fn element_kind(&self, element: &SchemaNode, field: &str) -> Result<ScalarKind, SchemaError> {
        self.resolve(element)?
            .scalar_kind()
            .ok_or_else(|| SchemaError::InvalidArrayItems {
                field: field.to_string(),
            })
    }

    /// Flattened `name: kind` labels for every parameter-consuming field,
    /// in the order they consume positional parameters.
    ///
    /// Summaries longer than `MAX_SUMMARY_PARAMS` end in `...`.
    pub fn parameter_summary(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_params(&self.root, "value", &mut out);
        if out.len() > MAX_SUMMARY_PARAMS {
            out.truncate(MAX_SUMMARY_PARAMS);
            out.push("...".into());
        }
        out
    }

    fn collect_params(&self, node: &SchemaNode, name: &str, out: &mut Vec<String>) {
        if out.len() > MAX_SUMMARY_PARAMS {
            return;
        }
        let Ok(resolved) = self.resolve(node) else {
            return;
        };
        match resolved {
            SchemaNode::Object(fields) => {
                for (field, child) in fields {
                    self.collect_params(child, field, out);
                }
            }
            SchemaNode::Array(element) => {
                let kind = self
                    .element_kind(element, name)
                    .unwrap_or(ScalarKind::String);
                out.push(format!("{name}: {kind}[]"));
            }
            leaf => {
                if let Some(kind) = leaf.scalar_kind() {
                    out.push(format!("{name}: {kind}"));
                }
            }
        }
    }

    /// Depth-first walk over every reachable node. `stack` holds the
    /// definitions on the current path; `done` holds definitions already
    /// proven sound, which are never walked twice.
    fn validate(&self) -> Result<(), SchemaError> {
        let mut stack = Vec::new();
        let mut done = HashSet::new();
        self.check(&self.root, "value", &mut stack, &mut done)?;
        for (name, node) in &self.defs {
            if done.contains(name.as_str()) {
                continue;
            }
            stack.push(name.as_str());
            self.check(node, name, &mut stack, &mut done)?;
            stack.pop();
            done.insert(name.as_str());
        }
        Ok(())
    }

    fn check<'a>(
        &'a self,
        node: &'a SchemaNode,
        field: &str,
        stack: &mut Vec<&'a str>,
        done: &mut HashSet<&'a str>,
    ) -> Result<(), SchemaError> {
        match node {
            SchemaNode::Reference(name) => {
                if stack.contains(&name.as_str()) {
                    return Err(SchemaError::CyclicReference { name: name.clone() });
                }
                if done.contains(name.as_str()) {
                    return Ok(());
                }
                let target = self
                    .defs
                    .get(name)
                    .ok_or_else(|| SchemaError::UnresolvedReference { name: name.clone() })?;
                stack.push(name.as_str());
                self.check(target, field, stack, done)?;
                stack.pop();
                done.insert(name.as_str());
                Ok(())
            }
            SchemaNode::Object(fields) => {
                for (name, child) in fields {
                    self.check(child, name, stack, done)?;
                }
                Ok(())
            }
            SchemaNode::Array(element) => {
                self.check(element, field, stack, done)?;
                self.element_kind(element, field).map(|_| ())
            }
            SchemaNode::Integer | SchemaNode::Number | SchemaNode::String => Ok(()),
        }
    }
}

fn parse_node(value: &Value) -> Result<SchemaNode, SchemaError> {
    let obj = value
        .as_object()
        .ok_or_else(|| SchemaError::Invalid(format!("expected a schema object, got {value}")))?;

    if let Some(reference) = obj.get("$ref") {
        let reference = reference
            .as_str()
            .ok_or_else(|| SchemaError::UnsupportedReference(reference.to_string()))?;
        return parse_reference(reference).map(SchemaNode::Reference);
    }

    match obj.get("type").and_then(Value::as_str) {
        Some("integer") => Ok(SchemaNode::Integer),
        Some("number") => Ok(SchemaNode::Number),
        Some("array") => {
            let items = match obj.get("items") {
                Some(items) => parse_node(items)?,
                None => SchemaNode::String,
            };
            Ok(SchemaNode::Array(Box::new(items)))
        }
        Some("object") => parse_properties(obj),
        None if obj.contains_key("properties") => parse_properties(obj),
        _ => Ok(SchemaNode::String),
    }
}

fn parse_properties(obj: &Map<String, Value>) -> Result<SchemaNode, SchemaError> {
    let fields = match obj.get("properties") {
        None => Vec::new(),
        Some(Value::Object(props)) => props
            .iter()
            .map(|(name, prop)| Ok((name.clone(), parse_node(prop)?)))
            .collect::<Result<Vec<_>, SchemaError>>()?,
        Some(other) => {
            return Err(SchemaError::Invalid(format!(
                "'properties' must be an object, got {other}"
            )));
        }
    };
    Ok(SchemaNode::Object(fields))
}

fn parse_reference(reference: &str) -> Result<String, SchemaError> {
    ["#/$defs/", "#/definitions/"]
        .iter()
        .find_map(|prefix| reference.strip_prefix(prefix))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SchemaError::UnsupportedReference(reference.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pydantic_verify_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "input": { "$ref": "#/$defs/VerifyInput" }
            },
            "required": ["input"],
            "$defs": {
                "VerifyInput": {
                    "type": "object",
                    "properties": {
                        "expression": { "type": "string" },
                        "expected": { "type": "number" }
                    },
                    "required": ["expression", "expected"]
                }
            }
        })
    }

    #[test]
    fn converts_pydantic_style_schema() {
        let schema = ToolSchema::from_json(&pydantic_verify_schema()).unwrap();
        assert_eq!(
            schema.root(),
            &SchemaNode::Object(vec![(
                "input".into(),
                SchemaNode::Reference("VerifyInput".into())
            )])
        );
        assert!(schema.defs().contains_key("VerifyInput"));
    }

    #[test]
    fn property_order_is_preserved() {
        let schema = ToolSchema::from_json(&pydantic_verify_schema()).unwrap();
        assert_eq!(
            schema.parameter_summary(),
            vec!["expression: string", "expected: number"]
        );
    }

    #[test]
    fn resolve_follows_reference_chain() {
        let mut defs = BTreeMap::new();
        defs.insert("Alias".to_string(), SchemaNode::Reference("Target".into()));
        defs.insert("Target".to_string(), SchemaNode::Integer);
        let schema = ToolSchema::new(SchemaNode::Reference("Alias".into()), defs).unwrap();

        let resolved = schema.resolve(schema.root()).unwrap();
        assert_eq!(resolved, &SchemaNode::Integer);
    }

    #[test]
    fn unresolved_reference_rejected() {
        let err = ToolSchema::from_json(&json!({
            "type": "object",
            "properties": { "input": { "$ref": "#/$defs/Missing" } }
        }))
        .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnresolvedReference {
                name: "Missing".into()
            }
        );
    }

    #[test]
    fn self_referencing_definition_rejected() {
        let err = ToolSchema::from_json(&json!({
            "type": "object",
            "properties": { "node": { "$ref": "#/$defs/Node" } },
            "$defs": {
                "Node": {
                    "type": "object",
                    "properties": { "next": { "$ref": "#/$defs/Node" } }
                }
            }
        }))
        .unwrap_err();
        assert!(matches!(err, SchemaError::CyclicReference { .. }));
    }

    #[test]
    fn mutual_reference_cycle_rejected() {
        let mut defs = BTreeMap::new();
        defs.insert("A".to_string(), SchemaNode::Reference("B".into()));
        defs.insert("B".to_string(), SchemaNode::Reference("A".into()));
        let err = ToolSchema::new(SchemaNode::Reference("A".into()), defs).unwrap_err();
        assert!(matches!(err, SchemaError::CyclicReference { .. }));
    }

    #[test]
    fn shared_definitions_are_checked_once() {
        let depth = 30;
        let mut defs = BTreeMap::new();
        for i in 0..depth {
            let next = SchemaNode::Reference(format!("D{}", i + 1));
            defs.insert(
                format!("D{i}"),
                SchemaNode::Object(vec![("x".into(), next.clone()), ("y".into(), next)]),
            );
        }
        defs.insert(format!("D{depth}"), SchemaNode::Integer);

        let started = std::time::Instant::now();
        let schema = ToolSchema::new(SchemaNode::Reference("D0".into()), defs).unwrap();
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
        assert_eq!(schema.defs.len(), depth + 1);

        let summary = schema.parameter_summary();
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
        assert_eq!(summary.len(), MAX_SUMMARY_PARAMS + 1);
        assert_eq!(summary[0], "x: integer");
        assert_eq!(summary.last().map(String::as_str), Some("..."));
    }

    #[test]
    fn shared_definition_inside_cycle_still_rejected() {
        let mut defs = BTreeMap::new();
        defs.insert(
            "A".to_string(),
            SchemaNode::Object(vec![
                ("left".into(), SchemaNode::Reference("B".into())),
                ("right".into(), SchemaNode::Reference("B".into())),
            ]),
        );
        defs.insert("B".to_string(), SchemaNode::Reference("A".into()));
        let err = ToolSchema::new(SchemaNode::Integer, defs).unwrap_err();
        assert!(matches!(err, SchemaError::CyclicReference { .. }));
    }

    #[test]
    fn array_of_objects_rejected() {
        let err = ToolSchema::from_json(&json!({
            "type": "object",
            "properties": {
                "rows": { "type": "array", "items": { "type": "object", "properties": {} } }
            }
        }))
        .unwrap_err();
        assert_eq!(
            err,
            SchemaError::InvalidArrayItems {
                field: "rows".into()
            }
        );
    }

    #[test]
    fn array_items_default_to_string() {
        let schema = ToolSchema::from_json(&json!({
            "type": "object",
            "properties": { "tags": { "type": "array" } }
        }))
        .unwrap();
        assert_eq!(schema.parameter_summary(), vec!["tags: string[]"]);
    }

    #[test]
    fn unknown_leaf_type_is_string() {
        let schema = ToolSchema::from_json(&json!({
            "type": "object",
            "properties": { "flag": { "type": "boolean" }, "any": {} }
        }))
        .unwrap();
        assert_eq!(schema.parameter_summary(), vec!["flag: string", "any: string"]);
    }

    #[test]
    fn external_reference_unsupported() {
        let err = ToolSchema::from_json(&json!({
            "type": "object",
            "properties": { "x": { "$ref": "https://example.com/schema.json" } }
        }))
        .unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedReference(_)));
    }

    #[test]
    fn empty_schema_has_no_parameters() {
        assert!(ToolSchema::empty().parameter_summary().is_empty());
        let schema = ToolSchema::from_json(&json!({ "type": "object", "properties": {} })).unwrap();
        assert!(schema.parameter_summary().is_empty());
    }
}
