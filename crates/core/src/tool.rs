//! Tool trait: the abstraction over agent capabilities.
//!
//! The loop never reasons about what a tool does. It only sees a name, a
//! description, a parameter schema and the rendered result of a call.

use crate::error::{SchemaError, ToolError};
use crate::schema::ToolSchema;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool executed successfully. `false` marks a domain
    /// error reported by the tool itself (e.g. division by zero).
    pub success: bool,

    /// The output content
    pub output: String,

    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            data: None,
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// How the decision policy treats a tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    /// Produces a value that must be checked by the verification tool
    /// on the very next step.
    Computation,
    /// Checks the result of a preceding computation.
    Verification,
    #[default]
    General,
}

impl ToolCategory {
    /// Every category, in listing order.
    pub const ALL: [ToolCategory; 3] = [Self::Computation, Self::Verification, Self::General];

    pub fn label(self) -> &'static str {
        match self {
            Self::Computation => "Computation",
            Self::Verification => "Verification",
            Self::General => "General",
        }
    }
}

/// The core Tool trait.
///
/// Tools are registered in a [`ToolCatalog`] and made available to the loop.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "add", "verify").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the oracle).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    fn category(&self) -> ToolCategory {
        ToolCategory::General
    }

    /// Execute the tool with bound arguments.
    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError>;
}

/// A tool's validated, immutable description.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub category: ToolCategory,
    pub schema: ToolSchema,
}

impl ToolDescriptor {
    /// Describe a tool, converting and validating its JSON Schema.
    pub fn from_tool(tool: &dyn Tool) -> Result<Self, SchemaError> {
        let schema =
            ToolSchema::from_json(&tool.parameters_schema()).map_err(|e| SchemaError::Tool {
                tool: tool.name().to_string(),
                source: Box::new(e),
            })?;
        Ok(Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            category: tool.category(),
            schema,
        })
    }

    /// `name(a: integer, b: integer) - description`
    pub fn signature(&self) -> String {
        let params = self.schema.parameter_summary();
        let params = if params.is_empty() {
            "no parameters".to_string()
        } else {
            params.join(", ")
        };
        format!("{}({}) - {}", self.name, params, self.description)
    }
}

impl fmt::Display for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

struct CatalogEntry {
    descriptor: ToolDescriptor,
    tool: Box<dyn Tool>,
}

/// The set of tools available to one run.
///
/// Every schema is converted and validated on registration; a catalog that
/// exists is a catalog whose schemas all resolve. Registration order is kept
/// so the tool list renders the same way every time.
#[derive(Default)]
pub struct ToolCatalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a list of tools, failing on the first bad schema.
    pub fn from_tools(tools: Vec<Box<dyn Tool>>) -> Result<Self, SchemaError> {
        let mut catalog = Self::new();
        for tool in tools {
            catalog.register(tool)?;
        }
        Ok(catalog)
    }

    /// Register a tool. Names must be unique.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<(), SchemaError> {
        if self.index.contains_key(tool.name()) {
            return Err(SchemaError::DuplicateTool(tool.name().to_string()));
        }
        let descriptor = ToolDescriptor::from_tool(tool.as_ref())?;
        self.index.insert(descriptor.name.clone(), self.entries.len());
        self.entries.push(CatalogEntry { descriptor, tool });
        Ok(())
    }

    /// Get a tool's descriptor by name.
    pub fn descriptor(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.entries[i].descriptor)
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&i| self.entries[i].tool.as_ref())
    }

    /// All descriptors, in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.entries.iter().map(|e| &e.descriptor)
    }

    /// Descriptors of the tools in a category, in registration order.
    pub fn descriptors_in(&self, category: ToolCategory) -> impl Iterator<Item = &ToolDescriptor> {
        self.descriptors().filter(move |d| d.category == category)
    }

    /// Names of the tools in a category, in registration order.
    pub fn names_in(&self, category: ToolCategory) -> Vec<&str> {
        self.descriptors_in(category).map(|d| d.name.as_str()).collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.descriptors().map(|d| d.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test tool for unit tests.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str { "echo" }
        fn description(&self) -> &str { "Echoes back the input" }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                },
                "required": ["text"]
            })
        }
        async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
            let text = arguments["text"].as_str().unwrap_or("").to_string();
            Ok(ToolResult::ok(text))
        }
    }

    struct BrokenTool;

    #[async_trait]
    impl Tool for BrokenTool {
        fn name(&self) -> &str { "broken" }
        fn description(&self) -> &str { "Schema points nowhere" }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": { "input": { "$ref": "#/$defs/Nowhere" } }
            })
        }
        async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::ok(""))
        }
    }

    struct TallyTool;

    #[async_trait]
    impl Tool for TallyTool {
        fn name(&self) -> &str { "tally" }
        fn description(&self) -> &str { "Counts to n" }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({ "type": "object", "properties": { "n": { "type": "integer" } } })
        }
        fn category(&self) -> ToolCategory { ToolCategory::Computation }
        async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::ok(arguments["n"].to_string()))
        }
    }

    #[test]
    fn catalog_register_and_lookup() {
        let catalog = ToolCatalog::from_tools(vec![Box::new(EchoTool)]).unwrap();
        assert!(catalog.get("echo").is_some());
        assert!(catalog.descriptor("echo").is_some());
        assert!(catalog.get("nonexistent").is_none());
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = ToolCatalog::from_tools(vec![Box::new(EchoTool), Box::new(EchoTool)])
            .err()
            .unwrap();
        assert_eq!(err, SchemaError::DuplicateTool("echo".into()));
    }

    #[test]
    fn bad_schema_fails_catalog_load() {
        let err = ToolCatalog::from_tools(vec![Box::new(EchoTool), Box::new(BrokenTool)])
            .err()
            .unwrap();
        match err {
            SchemaError::Tool { tool, source } => {
                assert_eq!(tool, "broken");
                assert!(matches!(*source, SchemaError::UnresolvedReference { .. }));
            }
            other => panic!("Expected tool schema error, got {other:?}"),
        }
    }

    #[test]
    fn descriptors_grouped_by_category() {
        let catalog = ToolCatalog::from_tools(vec![Box::new(EchoTool), Box::new(TallyTool)]).unwrap();
        let computation: Vec<_> = catalog
            .descriptors_in(ToolCategory::Computation)
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(computation, vec!["tally"]);
        assert_eq!(catalog.names_in(ToolCategory::General), vec!["echo"]);
        assert_eq!(catalog.descriptors_in(ToolCategory::Verification).count(), 0);
        assert_eq!(ToolCategory::ALL.map(ToolCategory::label), ["Computation", "Verification", "General"]);
    }

    #[test]
    fn signature_renders_parameters() {
        let descriptor = ToolDescriptor::from_tool(&EchoTool).unwrap();
        assert_eq!(descriptor.signature(), "echo(text: string) - Echoes back the input");
        assert_eq!(descriptor.category, ToolCategory::General);
    }

    #[tokio::test]
    async fn catalog_tool_executes() {
        let catalog = ToolCatalog::from_tools(vec![Box::new(EchoTool)]).unwrap();
        let tool = catalog.get("echo").unwrap();
        let result = tool
            .execute(serde_json::json!({"text": "hello world"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "hello world");
    }
}
