//! Conversation state machine: model step, tool step, conditional routing, checkpoint per
//! transition.
//!
//! Build with [`ChatGraph`], compile into a [`CompiledChatGraph`], then `invoke` or `stream`
//! turns by thread id.

mod chat_graph;
mod compile_error;
mod compiled;
mod locks;
pub mod logging;
mod phase;
mod retry;
mod run_context;
mod turn;

pub use chat_graph::{ChatGraph, DEFAULT_MAX_TOOL_ROUNDS};
pub use compile_error::CompilationError;
pub use compiled::{CompiledChatGraph, TOOL_ROUND_LIMIT_NOTICE};
pub use locks::{ThreadGuard, ThreadLocks};
pub use phase::{Phase, TurnOutcome};
pub use retry::RetryPolicy;
pub use run_context::RunContext;
pub use turn::{TurnExecutor, TurnResult};
