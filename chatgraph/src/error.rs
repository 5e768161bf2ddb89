//! Turn execution error types.
//!
//! Returned by `CompiledChatGraph::invoke` and surfaced by `stream` as a `Failed` event. Tool
//! failures never appear here: they are contained per call as error payloads.

use thiserror::Error;

use crate::llm::ModelError;
use crate::memory::CheckpointError;

/// Error that aborts a turn.
///
/// Nothing is checkpointed for the transition that failed; the thread stays at its last
/// completed transition.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The model call could not complete after the retry budget was exhausted.
    #[error("model unavailable after {attempts} attempt(s): {message}")]
    ModelUnavailable { attempts: u32, message: String },

    /// The model answered with something that cannot be turned into a message.
    #[error("invalid model response: {0}")]
    InvalidModelResponse(String),

    /// Loading or saving the thread's checkpoint failed; the conversation cannot proceed.
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// Thread identifiers must be non-empty.
    #[error("thread id must not be empty")]
    EmptyThreadId,
}

impl ChatError {
    /// Builds the error for a model failure after `attempts` tries.
    pub(crate) fn from_model(err: ModelError, attempts: u32) -> Self {
        match err {
            ModelError::Unavailable(message) => ChatError::ModelUnavailable { attempts, message },
            ModelError::InvalidResponse(message) => ChatError::InvalidModelResponse(message),
        }
    }
}
