//! Streaming types for chat turns.
//!
//! Defines stream modes and events emitted by `CompiledChatGraph::stream`. Every stream ends with
//! exactly one terminal event (`Completed` or `Failed`) regardless of the selected modes.

use std::collections::HashSet;

use serde::Serialize;

use crate::graph::TurnOutcome;
use crate::memory::CheckpointSource;
use crate::message::Message;

/// Stream mode selector: which kinds of events to emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamMode {
    /// Emit full history after each transition.
    Values,
    /// Emit the messages appended by each transition.
    Updates,
    /// Emit message chunks (LLM streaming).
    Messages,
}

impl StreamMode {
    /// All modes; what the HTTP API and CLI subscribe to.
    pub fn all() -> HashSet<StreamMode> {
        [StreamMode::Values, StreamMode::Updates, StreamMode::Messages]
            .into_iter()
            .collect()
    }
}

/// Metadata attached to streamed messages.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StreamMetadata {
    /// Step that produced the chunk (always `"model"` today).
    pub node: String,
}

/// One chunk of streamed message content.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MessageChunk {
    pub content: String,
}

/// Streamed event emitted while running a turn.
///
/// Serialized with an `event` tag so consumers can switch on [`StreamEvent::kind`].
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Text chunk from the model call in flight.
    Messages {
        chunk: MessageChunk,
        metadata: StreamMetadata,
    },
    /// Messages appended by one transition, after it was checkpointed.
    Updates {
        source: CheckpointSource,
        appended: Vec<Message>,
        checkpoint_seq: u64,
    },
    /// Full thread history after a transition.
    Values { messages: Vec<Message> },
    /// Terminal: the turn reached Done.
    Completed { outcome: TurnOutcome },
    /// Terminal: the turn was aborted; the store holds the last completed transition.
    Failed { message: String },
}

impl StreamEvent {
    /// Event kind; used as the SSE `event:` field.
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Messages { .. } => "messages",
            StreamEvent::Updates { .. } => "updates",
            StreamEvent::Values { .. } => "values",
            StreamEvent::Completed { .. } => "completed",
            StreamEvent::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamEvent::Completed { .. } | StreamEvent::Failed { .. }
        )
    }
}
