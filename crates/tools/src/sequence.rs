//! List and string tools.

use crate::input::{Field, Input, float_result, input_schema, int_result, list_result};
use async_trait::async_trait;
use ironloop_core::error::ToolError;
use ironloop_core::tool::{Tool, ToolCategory, ToolResult};

/// Sum a list of integers.
pub struct AddListTool;

#[async_trait]
impl Tool for AddListTool {
    fn name(&self) -> &str {
        "add_list"
    }

    fn description(&self) -> &str {
        "Add all numbers in a list"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        input_schema("AddListInput", &[("l", Field::IntList)])
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Computation
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let values = Input::from_arguments(self.name(), &arguments)?.int_list("l")?;
        if values.is_empty() {
            return Ok(ToolResult::failed("List cannot be empty"));
        }
        Ok(values
            .iter()
            .try_fold(0i64, |acc, &v| acc.checked_add(v))
            .map_or_else(|| ToolResult::failed("Integer overflow"), int_result))
    }
}

/// ASCII (Unicode scalar) values of the characters in a word.
pub struct StringsToCharsToIntTool;

#[async_trait]
impl Tool for StringsToCharsToIntTool {
    fn name(&self) -> &str {
        "strings_to_chars_to_int"
    }

    fn description(&self) -> &str {
        "Return the ASCII values of the characters in a word"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        input_schema("StringsToCharsToIntInput", &[("string", Field::Str)])
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Computation
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let word = Input::from_arguments(self.name(), &arguments)?.string("string")?;
        Ok(list_result(word.chars().map(|c| i64::from(u32::from(c))).collect()))
    }
}

/// Sum of `e^x` over a list of integers.
pub struct IntListToExponentialSumTool;

#[async_trait]
impl Tool for IntListToExponentialSumTool {
    fn name(&self) -> &str {
        "int_list_to_exponential_sum"
    }

    fn description(&self) -> &str {
        "Return sum of exponentials of numbers in a list"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        input_schema("IntListToExponentialSumInput", &[("int_list", Field::IntList)])
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Computation
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let values = Input::from_arguments(self.name(), &arguments)?.int_list("int_list")?;
        if values.is_empty() {
            return Ok(ToolResult::failed("List cannot be empty"));
        }
        Ok(float_result(values.iter().map(|&v| (v as f64).exp()).sum()))
    }
}

/// The first `n` Fibonacci numbers.
pub struct FibonacciNumbersTool;

/// The first 93 terms (up to F(92)) fit in an i64.
const MAX_FIBONACCI_COUNT: i64 = 93;

#[async_trait]
impl Tool for FibonacciNumbersTool {
    fn name(&self) -> &str {
        "fibonacci_numbers"
    }

    fn description(&self) -> &str {
        "Return the first n Fibonacci Numbers"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        input_schema("FibonacciNumbersInput", &[("n", Field::Int)])
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Computation
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let n = Input::from_arguments(self.name(), &arguments)?.int("n")?;
        if n > MAX_FIBONACCI_COUNT {
            return Ok(ToolResult::failed(format!(
                "n must be at most {MAX_FIBONACCI_COUNT}, got {n}"
            )));
        }
        Ok(list_result(fibonacci(n.max(0) as usize)))
    }
}

fn fibonacci(n: usize) -> Vec<i64> {
    let mut sequence = Vec::with_capacity(n);
    let (mut a, mut b) = (0i64, 1i64);
    for _ in 0..n {
        sequence.push(a);
        let next = a.saturating_add(b);
        a = b;
        b = next;
    }
    sequence
}

/// All list and string tools, in catalog order.
pub fn sequence_tools() -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(AddListTool),
        Box::new(StringsToCharsToIntTool),
        Box::new(IntListToExponentialSumTool),
        Box::new(FibonacciNumbersTool),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn add_list_sums() {
        let result = AddListTool
            .execute(json!({ "input": { "l": [1, 2, 3] } }))
            .await
            .unwrap();
        assert_eq!(result.output, "6");
    }

    #[tokio::test]
    async fn add_list_rejects_empty() {
        let result = AddListTool
            .execute(json!({ "input": { "l": [] } }))
            .await
            .unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn ascii_values_of_india() {
        let result = StringsToCharsToIntTool
            .execute(json!({ "input": { "string": "INDIA" } }))
            .await
            .unwrap();
        assert_eq!(result.output, "[73,78,68,73,65]");
    }

    #[tokio::test]
    async fn exponential_sum() {
        let result = IntListToExponentialSumTool
            .execute(json!({ "input": { "int_list": [0, 0] } }))
            .await
            .unwrap();
        assert_eq!(result.output, "2.0");
    }

    #[tokio::test]
    async fn exponential_sum_overflow_is_failed() {
        let result = IntListToExponentialSumTool
            .execute(json!({ "input": { "int_list": [1000] } }))
            .await
            .unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn fibonacci_first_n() {
        let result = FibonacciNumbersTool
            .execute(json!({ "input": { "n": 7 } }))
            .await
            .unwrap();
        assert_eq!(result.output, "[0,1,1,2,3,5,8]");

        let empty = FibonacciNumbersTool
            .execute(json!({ "input": { "n": -3 } }))
            .await
            .unwrap();
        assert_eq!(empty.output, "[]");
    }

    #[test]
    fn fibonacci_upper_bound_fits() {
        let sequence = fibonacci(MAX_FIBONACCI_COUNT as usize);
        assert_eq!(*sequence.last().unwrap(), 7_540_113_804_746_346_429);
    }

    #[tokio::test]
    async fn fibonacci_beyond_bound_is_failed() {
        let result = FibonacciNumbersTool
            .execute(json!({ "input": { "n": 94 } }))
            .await
            .unwrap();
        assert!(!result.success);
    }
}
