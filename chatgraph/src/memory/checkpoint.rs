//! Checkpoint and metadata types.
//!
//! A checkpoint is the full message history of one thread after one transition, numbered by a
//! per-thread `seq` that starts at 1.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::Message;

/// Which transition produced the checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointSource {
    /// Model transition: user input (first round) plus the assistant message.
    Model,
    /// Tool transition: the batch of tool results.
    Tools,
}

impl CheckpointSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointSource::Model => "model",
            CheckpointSource::Tools => "tools",
        }
    }

    /// Inverse of [`as_str`](Self::as_str); `None` for unknown text.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "model" => Some(CheckpointSource::Model),
            "tools" => Some(CheckpointSource::Tools),
            _ => None,
        }
    }
}

/// Metadata for a single checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub source: CheckpointSource,
    pub created_at: DateTime<Utc>,
}

/// One checkpoint: the thread's ordered messages after a transition.
///
/// **Interaction**: Returned by `Checkpointer::save` and `Checkpointer::latest`; the chat graph
/// reports `seq` in `TurnOutcome::checkpoint_seq`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub thread_id: String,
    pub seq: u64,
    pub messages: Vec<Message>,
    pub metadata: CheckpointMetadata,
}

impl Checkpoint {
    pub fn new(
        thread_id: impl Into<String>,
        seq: u64,
        messages: Vec<Message>,
        source: CheckpointSource,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            seq,
            messages,
            metadata: CheckpointMetadata {
                source,
                created_at: Utc::now(),
            },
        }
    }

    pub fn list_item(&self) -> CheckpointListItem {
        CheckpointListItem {
            seq: self.seq,
            source: self.metadata.source,
            created_at: self.metadata.created_at,
            message_count: self.messages.len(),
        }
    }
}

/// Item returned by `Checkpointer::list` for history views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointListItem {
    pub seq: u64,
    pub source: CheckpointSource,
    pub created_at: DateTime<Utc>,
    pub message_count: usize,
}
