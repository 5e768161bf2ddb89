//! Calculator tool: one arithmetic operation on two numbers.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{required_f64, required_str, Tool, ToolError, ToolSpec};

/// Tool name for the calculator.
pub const TOOL_CALCULATOR: &str = "calculator";

/// Performs `add`, `sub`, `mul` or `div` on `first_num` and `second_num`.
///
/// The result echoes the operands and the operation:
/// `{"first_num": 3, "second_num": 4, "operation": "add", "result": 7}`.
/// Division by zero and unsupported operations are execution errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct CalculatorTool;

impl CalculatorTool {
    pub fn new() -> Self {
        Self
    }

    fn evaluate(first: f64, second: f64, operation: &str) -> Result<f64, ToolError> {
        match operation {
            "add" => Ok(first + second),
            "sub" => Ok(first - second),
            "mul" => Ok(first * second),
            "div" => {
                if second == 0.0 {
                    Err(ToolError::Execution(
                        "Division by zero is not allowed".to_string(),
                    ))
                } else {
                    Ok(first / second)
                }
            }
            other => Err(ToolError::Execution(format!(
                "Unsupported operation '{}'",
                other
            ))),
        }
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        TOOL_CALCULATOR
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_CALCULATOR.to_string(),
            description: Some(
                "Perform a basic arithmetic operation on two numbers. \
                 Supported operations: add, sub, mul, div."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "first_num": { "type": "number", "description": "Left operand" },
                    "second_num": { "type": "number", "description": "Right operand" },
                    "operation": {
                        "type": "string",
                        "enum": ["add", "sub", "mul", "div"],
                        "description": "Operation to apply"
                    }
                },
                "required": ["first_num", "second_num", "operation"]
            }),
        }
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let first = required_f64(&args, "first_num")?;
        let second = required_f64(&args, "second_num")?;
        let operation = required_str(&args, "operation")?;
        let result = Self::evaluate(first, second, operation)?;
        Ok(json!({
            "first_num": first,
            "second_num": second,
            "operation": operation,
            "result": result,
        }))
    }
}
