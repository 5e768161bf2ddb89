//! Chat graph compilation error.
//!
//! Returned by `ChatGraph::compile` when the configuration could never complete a turn.

use thiserror::Error;

/// Invalid chat graph configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompilationError {
    /// `max_tool_rounds` must be at least 1.
    #[error("max_tool_rounds must be at least 1")]
    ZeroToolRounds,

    /// The retry policy must allow at least one model call.
    #[error("retry policy must allow at least one attempt")]
    ZeroRetryAttempts,
}
