//! Tool dispatcher: runs a batch of tool calls and returns one result per call, in request order.
//!
//! Calls in a batch have no ordering dependency, so they run concurrently; results are
//! reassembled in request order. A failing call (unknown name, bad input, transport error,
//! timeout) yields an error payload for that call only; siblings are unaffected.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, trace, warn};

use crate::message::{ToolCall, ToolPayload, ToolResult};

use super::{ToolError, ToolRegistry};

/// Truncates a string for logging, appending "..." if longer than max_len.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}

/// Executes tool calls against a [`ToolRegistry`].
///
/// **Interaction**: Owned by the compiled chat graph; invoked in the `AwaitingTools` phase.
#[derive(Clone, Debug)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    timeout: Option<Duration>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            timeout: None,
        }
    }

    /// Bounds each call; an expired call yields a `timeout` error payload.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Runs all calls; returns exactly one result per call in the order given.
    pub async fn dispatch(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        join_all(calls.iter().map(|call| self.dispatch_one(call))).await
    }

    async fn dispatch_one(&self, call: &ToolCall) -> ToolResult {
        debug!(tool = %call.name, call_id = %call.id, args = ?call.arguments, "Calling tool");

        let payload = match self.run(call).await {
            Ok(result) => {
                trace!(
                    tool = %call.name,
                    result_preview = %truncate_for_log(&result.to_string(), 200),
                    "Tool returned"
                );
                ToolPayload::Success { result }
            }
            Err(e) => {
                warn!(tool = %call.name, call_id = %call.id, error = %e, "Tool call failed");
                e.to_payload()
            }
        };

        ToolResult {
            call_id: call.id.clone(),
            name: call.name.clone(),
            payload,
        }
    }

    async fn run(&self, call: &ToolCall) -> Result<serde_json::Value, ToolError> {
        let tool = self.registry.resolve(&call.name)?;
        let fut = tool.call(call.arguments.clone());
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| ToolError::Timeout(limit.as_millis()))?,
            None => fut.await,
        }
    }
}
