//! Chat graph builder: model + tools + limits, compiled into a runnable machine.

use std::sync::Arc;
use std::time::Duration;

use crate::llm::LlmClient;
use crate::memory::{Checkpointer, MemorySaver};
use crate::tools::{ToolDispatcher, ToolRegistry};

use super::compiled::CompiledChatGraph;
use super::locks::ThreadLocks;
use super::turn::TurnExecutor;
use super::{CompilationError, RetryPolicy};

/// Default cap on tool round-trips per turn.
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 8;

/// Builder for the conversation state machine.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use chatgraph::graph::ChatGraph;
/// use chatgraph::llm::MockLlm;
/// use chatgraph::tools::{CalculatorTool, Tool, ToolRegistry};
///
/// let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(CalculatorTool)];
/// let registry = ToolRegistry::with_tools(tools).unwrap();
/// let graph = ChatGraph::new(Arc::new(MockLlm::with_no_tool_calls("hi")), registry)
///     .with_max_tool_rounds(4)
///     .compile()
///     .unwrap();
/// ```
pub struct ChatGraph {
    llm: Arc<dyn LlmClient>,
    registry: Arc<ToolRegistry>,
    max_tool_rounds: usize,
    retry: RetryPolicy,
    tool_timeout: Option<Duration>,
}

impl ChatGraph {
    pub fn new(llm: Arc<dyn LlmClient>, registry: ToolRegistry) -> Self {
        Self {
            llm,
            registry: Arc::new(registry),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            retry: RetryPolicy::default(),
            tool_timeout: None,
        }
    }

    /// Tool round-trips allowed per turn before the model is asked to answer without tools.
    pub fn with_max_tool_rounds(mut self, max_tool_rounds: usize) -> Self {
        self.max_tool_rounds = max_tool_rounds;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Per tool call limit; an expired call becomes a `timeout` error payload.
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = Some(timeout);
        self
    }

    /// Compiles with an in-memory checkpointer.
    pub fn compile(self) -> Result<CompiledChatGraph, CompilationError> {
        self.compile_with_checkpointer(Arc::new(MemorySaver::new()))
    }

    pub fn compile_with_checkpointer(
        self,
        checkpointer: Arc<dyn Checkpointer>,
    ) -> Result<CompiledChatGraph, CompilationError> {
        if self.max_tool_rounds == 0 {
            return Err(CompilationError::ZeroToolRounds);
        }
        if self.retry.max_attempts == 0 {
            return Err(CompilationError::ZeroRetryAttempts);
        }

        let mut dispatcher = ToolDispatcher::new(Arc::clone(&self.registry));
        if let Some(timeout) = self.tool_timeout {
            dispatcher = dispatcher.with_timeout(timeout);
        }

        Ok(CompiledChatGraph {
            executor: TurnExecutor::new(self.llm),
            dispatcher,
            checkpointer,
            max_tool_rounds: self.max_tool_rounds,
            retry: self.retry,
            locks: Arc::new(ThreadLocks::new()),
        })
    }
}
