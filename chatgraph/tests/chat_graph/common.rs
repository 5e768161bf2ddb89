//! Shared helpers for chat graph integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chatgraph::tools::CalculatorTool;
use chatgraph::{
    ChatGraph, Checkpoint, CheckpointError, CheckpointListItem, CheckpointSource, Checkpointer,
    CompiledChatGraph, LlmResponse, MemorySaver, Message, MockLlm, RetryPolicy, Tool, ToolCall,
    ToolError, ToolRegistry, ToolSpec,
};
use serde_json::{json, Value};

pub fn calc_call(id: &str, first: f64, second: f64, op: &str) -> ToolCall {
    ToolCall::new(
        id,
        "calculator",
        json!({"first_num": first, "second_num": second, "operation": op}),
    )
}

pub fn tool_response(calls: Vec<ToolCall>) -> Result<LlmResponse, chatgraph::ModelError> {
    Ok(LlmResponse::with_tool_calls("", calls))
}

pub fn text_response(text: &str) -> Result<LlmResponse, chatgraph::ModelError> {
    Ok(LlmResponse::text(text))
}

/// Echoes its arguments after an optional delay.
pub struct EchoTool {
    pub name: &'static str,
    pub delay: Duration,
}

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        self.name
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.to_string(),
            description: Some("Echo arguments".into()),
            input_schema: json!({"type": "object"}),
        }
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        tokio::time::sleep(self.delay).await;
        Ok(args)
    }
}

/// Always fails with an execution error.
pub struct BrokenTool;

#[async_trait]
impl Tool for BrokenTool {
    fn name(&self) -> &str {
        "broken"
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "broken".into(),
            description: None,
            input_schema: json!({"type": "object"}),
        }
    }

    async fn call(&self, _args: Value) -> Result<Value, ToolError> {
        Err(ToolError::Execution("upstream returned 500".into()))
    }
}

pub fn registry() -> ToolRegistry {
    let tools: Vec<Arc<dyn Tool>> = vec![
        Arc::new(CalculatorTool),
        Arc::new(EchoTool {
            name: "echo",
            delay: Duration::ZERO,
        }),
        Arc::new(BrokenTool),
    ];
    ToolRegistry::with_tools(tools).unwrap()
}

pub fn graph_with(
    llm: Arc<MockLlm>,
    checkpointer: Arc<dyn Checkpointer>,
    max_tool_rounds: usize,
) -> CompiledChatGraph {
    ChatGraph::new(llm, registry())
        .with_max_tool_rounds(max_tool_rounds)
        .with_retry_policy(RetryPolicy::immediate(3))
        .compile_with_checkpointer(checkpointer)
        .unwrap()
}

pub fn graph(llm: Arc<MockLlm>) -> CompiledChatGraph {
    graph_with(llm, Arc::new(MemorySaver::new()), 8)
}

/// Delegates to a MemorySaver but fails every save from the `fail_from`-th on (1-based).
pub struct FailingSaves {
    pub inner: MemorySaver,
    pub fail_from: usize,
    pub saves: AtomicUsize,
}

impl FailingSaves {
    pub fn new(fail_from: usize) -> Self {
        Self {
            inner: MemorySaver::new(),
            fail_from,
            saves: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Checkpointer for FailingSaves {
    async fn save(
        &self,
        thread_id: &str,
        messages: &[Message],
        source: CheckpointSource,
    ) -> Result<Checkpoint, CheckpointError> {
        let n = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        if n >= self.fail_from {
            return Err(CheckpointError::Storage("disk full".into()));
        }
        self.inner.save(thread_id, messages, source).await
    }

    async fn latest(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        self.inner.latest(thread_id).await
    }

    async fn list(&self, thread_id: &str) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        self.inner.list(thread_id).await
    }

    async fn list_thread_ids(&self) -> Result<Vec<String>, CheckpointError> {
        self.inner.list_thread_ids().await
    }
}
