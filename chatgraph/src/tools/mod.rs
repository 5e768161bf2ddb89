//! Tools: declared specs, the `Tool` trait, the registry and the dispatcher.
//!
//! Tools are registered once at startup with a static [`ToolSpec`]; the registry presents the
//! specs to the model and the dispatcher executes the calls the model requests. A failing call
//! never aborts a batch: its [`ToolError`] becomes an error payload in that call's result.

mod calculator;
mod dispatcher;
mod registry;
mod stock_price;
mod r#trait;
pub mod web;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::message::{ToolErrorKind, ToolPayload};

pub use calculator::{CalculatorTool, TOOL_CALCULATOR};
pub use dispatcher::ToolDispatcher;
pub use r#trait::Tool;
pub use registry::{RegistryError, ToolRegistry};
pub use stock_price::{StockPriceTool, TOOL_GET_STOCK_PRICE};
pub use web::{WebSearchTool, TOOL_WEB_SEARCH};

/// Tool descriptor presented to the model: name, description and JSON Schema for arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: Option<String>,
    /// JSON Schema object describing the named, typed parameters.
    pub input_schema: Value,
}

/// Error from resolving or executing a tool. Contained per call by the dispatcher.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("execution failed: {0}")]
    Execution(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("timed out after {0} ms")]
    Timeout(u128),
}

impl ToolError {
    pub fn kind(&self) -> ToolErrorKind {
        match self {
            ToolError::UnknownTool(_) => ToolErrorKind::UnknownTool,
            ToolError::InvalidInput(_) => ToolErrorKind::InvalidInput,
            ToolError::Execution(_) => ToolErrorKind::Execution,
            ToolError::Transport(_) => ToolErrorKind::Transport,
            ToolError::Timeout(_) => ToolErrorKind::Timeout,
        }
    }

    /// Structured error payload carried by the tool-result message.
    pub fn to_payload(&self) -> ToolPayload {
        ToolPayload::Error {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Reads a required string argument.
pub(crate) fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidInput(format!("missing string argument '{}'", key)))
}

/// Reads a required numeric argument; numeric strings are accepted since models emit them.
pub(crate) fn required_f64(args: &Value, key: &str) -> Result<f64, ToolError> {
    match args.get(key) {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| ToolError::InvalidInput(format!("argument '{}' is not finite", key))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ToolError::InvalidInput(format!("argument '{}' is not a number", key))),
        _ => Err(ToolError::InvalidInput(format!(
            "missing numeric argument '{}'",
            key
        ))),
    }
}
