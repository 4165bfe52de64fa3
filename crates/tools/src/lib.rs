//! Built-in tool implementations for IronLoop.
//!
//! Tools give the loop something to act with: integer arithmetic,
//! list and string helpers, and `verify`, which re-evaluates an expression
//! to check a previous result.
//!
//! Every tool declares its parameters the same way, as a root object with a
//! single `input` property that references a named definition.

pub mod arithmetic;
pub mod expression;
mod input;
pub mod sequence;
pub mod verify;

use ironloop_core::error::SchemaError;
use ironloop_core::tool::{Tool, ToolCatalog};

pub use verify::VerifyTool;

/// All built-in tools, in catalog order.
pub fn default_tools() -> Vec<Box<dyn Tool>> {
    let mut tools = arithmetic::arithmetic_tools();
    tools.extend(sequence::sequence_tools());
    tools.push(Box::new(VerifyTool));
    tools
}

/// Create a catalog with all built-in tools.
///
/// Fails only if a built-in schema is malformed, which is a bug.
pub fn default_catalog() -> Result<ToolCatalog, SchemaError> {
    ToolCatalog::from_tools(default_tools())
}
