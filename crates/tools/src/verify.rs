//! The verification tool: checks a claimed result against an expression.

use crate::expression::evaluate;
use crate::input::{Field, Input, input_schema};
use async_trait::async_trait;
use ironloop_core::error::ToolError;
use ironloop_core::tool::{Tool, ToolCategory, ToolResult};
use serde_json::json;

/// Below this magnitude an absolute tolerance applies.
const SMALL_MAGNITUDE: f64 = 1e-6;
const RELATIVE_TOLERANCE: f64 = 1e-4;
const ABSOLUTE_TOLERANCE: f64 = 1e-10;

pub struct VerifyTool;

/// Whether `actual` matches `expected` within tolerance.
pub fn matches_expected(actual: f64, expected: f64) -> bool {
    if expected.abs() > SMALL_MAGNITUDE {
        ((actual - expected) / expected).abs() < RELATIVE_TOLERANCE
    } else {
        (actual - expected).abs() < ABSOLUTE_TOLERANCE
    }
}

#[async_trait]
impl Tool for VerifyTool {
    fn name(&self) -> &str {
        "verify"
    }

    fn description(&self) -> &str {
        "Verify if a calculation is correct: evaluates the expression and compares it with the expected value"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        input_schema(
            "VerifyInput",
            &[("expression", Field::Str), ("expected", Field::Float)],
        )
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Verification
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let input = Input::from_arguments(self.name(), &arguments)?;
        let expression = input.string("expression")?;
        let expected = input.float("expected")?;

        let actual = match evaluate(expression) {
            Ok(value) => value,
            Err(e) => return Ok(ToolResult::failed(format!("Error: {e}"))),
        };

        let correct = matches_expected(actual, expected);
        tracing::debug!(expression, actual, expected, correct, "Verified calculation");

        let output = if correct {
            "True".to_string()
        } else {
            format!("False (actual: {actual})")
        };
        Ok(ToolResult::ok(output).with_data(json!({ "result": correct, "actual": actual })))
    }
}
