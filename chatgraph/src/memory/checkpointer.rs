//! Checkpointer trait and error type.
//!
//! Implementations persist one checkpoint per transition and enforce compare-and-append: a save
//! must extend the thread's latest messages, so two writers can never silently overwrite or
//! reorder each other.

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::checkpoint::{Checkpoint, CheckpointListItem, CheckpointSource};
use crate::message::Message;

/// Error from checkpoint operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CheckpointError {
    /// The backing store failed (I/O, SQL, lock poisoning).
    #[error("storage error: {0}")]
    Storage(String),
    /// Stored bytes could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// The save does not extend the latest checkpoint for the thread.
    #[error("conflicting write on thread {thread_id}: history diverged from checkpoint {latest_seq}")]
    Conflict { thread_id: String, latest_seq: u64 },
}

/// Saves and loads per-thread checkpoints.
///
/// **Interaction**: Used by `CompiledChatGraph` (load before a turn, save after each transition)
/// and by `ThreadCatalog` (thread listing).
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Appends a checkpoint with the next seq. `messages` is the full history after the
    /// transition and must extend the latest checkpoint's messages.
    async fn save(
        &self,
        thread_id: &str,
        messages: &[Message],
        source: CheckpointSource,
    ) -> Result<Checkpoint, CheckpointError>;

    /// Latest checkpoint for the thread, `None` for an unknown thread.
    async fn latest(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError>;

    /// All checkpoints for the thread in ascending seq order (metadata only).
    async fn list(&self, thread_id: &str) -> Result<Vec<CheckpointListItem>, CheckpointError>;

    /// Distinct thread ids with at least one checkpoint; order unspecified.
    async fn list_thread_ids(&self) -> Result<Vec<String>, CheckpointError>;

    /// Latest messages for the thread; empty for an unknown thread.
    async fn load_latest(&self, thread_id: &str) -> Result<Vec<Message>, CheckpointError> {
        Ok(self
            .latest(thread_id)
            .await?
            .map(|cp| cp.messages)
            .unwrap_or_default())
    }
}

/// Compare-and-append check shared by the implementations.
pub(crate) fn ensure_extends(
    thread_id: &str,
    latest: Option<(u64, &[Message])>,
    next: &[Message],
) -> Result<(), CheckpointError> {
    if let Some((latest_seq, prev)) = latest {
        if next.len() < prev.len() || next[..prev.len()] != *prev {
            return Err(CheckpointError::Conflict {
                thread_id: thread_id.to_string(),
                latest_seq,
            });
        }
    }
    Ok(())
}
