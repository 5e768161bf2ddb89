//! The `Tool` trait: one named, statically described, callable tool.

use async_trait::async_trait;
use serde_json::Value;

use super::{ToolError, ToolSpec};

/// A tool the model may call.
///
/// `spec()` is declared statically (no schema inference); `call` is a function of its arguments
/// to a structured JSON result or a structured error.
///
/// **Interaction**: Registered in [`ToolRegistry`](super::ToolRegistry), executed by
/// [`ToolDispatcher`](super::ToolDispatcher).
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name; must equal `spec().name`.
    fn name(&self) -> &str;

    fn spec(&self) -> ToolSpec;

    async fn call(&self, args: Value) -> Result<Value, ToolError>;
}
