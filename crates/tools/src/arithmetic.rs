//! Arithmetic tools over integer inputs.
//!
//! Each tool is a name, a description and a plain function. Results that
//! cannot be represented (overflow, division by zero, a negative square
//! root) come back as failed results rather than errors, so the loop can
//! report them to the oracle and carry on.

use crate::input::{Field, Input, float_result, input_schema, int_result};
use async_trait::async_trait;
use ironloop_core::error::ToolError;
use ironloop_core::tool::{Tool, ToolCategory, ToolResult};

type BinaryOp = fn(i64, i64) -> ToolResult;
type UnaryOp = fn(i64) -> ToolResult;

/// A tool taking two integers `a` and `b`.
pub struct BinaryTool {
    name: &'static str,
    description: &'static str,
    def_name: &'static str,
    op: BinaryOp,
}

/// A tool taking one integer `a`.
pub struct UnaryTool {
    name: &'static str,
    description: &'static str,
    def_name: &'static str,
    op: UnaryOp,
}

#[async_trait]
impl Tool for BinaryTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        input_schema(self.def_name, &[("a", Field::Int), ("b", Field::Int)])
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Computation
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let input = Input::from_arguments(self.name, &arguments)?;
        Ok((self.op)(input.int("a")?, input.int("b")?))
    }
}

#[async_trait]
impl Tool for UnaryTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        input_schema(self.def_name, &[("a", Field::Int)])
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Computation
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let input = Input::from_arguments(self.name, &arguments)?;
        Ok((self.op)(input.int("a")?))
    }
}

fn binary(
    name: &'static str,
    description: &'static str,
    def_name: &'static str,
    op: BinaryOp,
) -> Box<dyn Tool> {
    Box::new(BinaryTool { name, description, def_name, op })
}

fn unary(
    name: &'static str,
    description: &'static str,
    def_name: &'static str,
    op: UnaryOp,
) -> Box<dyn Tool> {
    Box::new(UnaryTool { name, description, def_name, op })
}

/// All arithmetic tools, in catalog order.
pub fn arithmetic_tools() -> Vec<Box<dyn Tool>> {
    vec![
        binary("add", "Add two numbers", "AddInput", add),
        binary("subtract", "Subtract two numbers", "SubtractInput", subtract),
        binary("multiply", "Multiply two numbers", "MultiplyInput", multiply),
        binary("divide", "Divide two numbers", "DivideInput", divide),
        binary("power", "Power of two numbers", "PowerInput", power),
        unary("sqrt", "Square root of a number", "SqrtInput", sqrt),
        unary("cbrt", "Cube root of a number", "CbrtInput", cbrt),
        unary("factorial", "Factorial of a number", "FactorialInput", factorial),
        unary("log", "Natural log of a number", "LogInput", log),
        binary(
            "remainder",
            "Remainder of dividing two numbers",
            "RemainderInput",
            remainder,
        ),
        unary("sin", "Sine of a number", "SinInput", |a| float_result((a as f64).sin())),
        unary("cos", "Cosine of a number", "CosInput", |a| float_result((a as f64).cos())),
        unary("tan", "Tangent of a number", "TanInput", |a| float_result((a as f64).tan())),
        binary("mine", "Special mining tool: a - b - b", "MineInput", mine),
    ]
}

fn checked(value: Option<i64>) -> ToolResult {
    value.map_or_else(|| ToolResult::failed("Integer overflow"), int_result)
}

fn add(a: i64, b: i64) -> ToolResult {
    checked(a.checked_add(b))
}

fn subtract(a: i64, b: i64) -> ToolResult {
    checked(a.checked_sub(b))
}

fn multiply(a: i64, b: i64) -> ToolResult {
    checked(a.checked_mul(b))
}

fn divide(a: i64, b: i64) -> ToolResult {
    if b == 0 {
        return ToolResult::failed("Division by zero");
    }
    float_result(a as f64 / b as f64)
}

fn power(a: i64, b: i64) -> ToolResult {
    match u32::try_from(b) {
        Ok(exp) => checked(a.checked_pow(exp)),
        Err(_) => ToolResult::failed(format!("Exponent must be a non-negative integer, got {b}")),
    }
}

fn sqrt(a: i64) -> ToolResult {
    if a < 0 {
        return ToolResult::failed(format!("Cannot take the square root of {a}"));
    }
    float_result((a as f64).sqrt())
}

fn cbrt(a: i64) -> ToolResult {
    float_result((a as f64).cbrt())
}

fn factorial(a: i64) -> ToolResult {
    if a < 0 {
        return ToolResult::failed(format!("Factorial is not defined for {a}"));
    }
    checked((2..=a).try_fold(1i64, |acc, n| acc.checked_mul(n)))
}

fn log(a: i64) -> ToolResult {
    if a <= 0 {
        return ToolResult::failed(format!("Logarithm is not defined for {a}"));
    }
    float_result((a as f64).ln())
}

/// Remainder with the sign of the divisor (floored division).
fn remainder(a: i64, b: i64) -> ToolResult {
    if b == 0 {
        return ToolResult::failed("Division by zero");
    }
    match a.checked_rem(b) {
        Some(r) if r != 0 && (r < 0) != (b < 0) => int_result(r + b),
        Some(r) => int_result(r),
        None => ToolResult::failed("Integer overflow"),
    }
}

fn mine(a: i64, b: i64) -> ToolResult {
    checked(a.checked_sub(b).and_then(|d| d.checked_sub(b)))
}
