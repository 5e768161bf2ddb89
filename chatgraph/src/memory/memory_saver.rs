//! In-memory checkpointer (MemorySaver).
//!
//! Keeps every checkpoint per thread in a map behind an async RwLock. Not persistent; for dev,
//! tests and the default `ChatGraph::compile()`.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::memory::checkpoint::{Checkpoint, CheckpointListItem, CheckpointSource};
use crate::memory::checkpointer::{ensure_extends, CheckpointError, Checkpointer};
use crate::message::Message;

/// In-memory checkpointer. Saves are atomic per thread: the write lock covers the
/// compare-and-append check and the push.
#[derive(Debug, Default)]
pub struct MemorySaver {
    inner: RwLock<HashMap<String, Vec<Checkpoint>>>,
}

impl MemorySaver {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for MemorySaver {
    async fn save(
        &self,
        thread_id: &str,
        messages: &[Message],
        source: CheckpointSource,
    ) -> Result<Checkpoint, CheckpointError> {
        let mut guard = self.inner.write().await;
        let history = guard.entry(thread_id.to_string()).or_default();
        let latest = history.last().map(|cp| (cp.seq, cp.messages.as_slice()));
        ensure_extends(thread_id, latest, messages)?;
        let seq = history.last().map(|cp| cp.seq + 1).unwrap_or(1);
        let checkpoint = Checkpoint::new(thread_id, seq, messages.to_vec(), source);
        history.push(checkpoint.clone());
        Ok(checkpoint)
    }

    async fn latest(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        let guard = self.inner.read().await;
        Ok(guard.get(thread_id).and_then(|h| h.last().cloned()))
    }

    async fn list(&self, thread_id: &str) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let guard = self.inner.read().await;
        Ok(guard
            .get(thread_id)
            .map(|h| h.iter().map(Checkpoint::list_item).collect())
            .unwrap_or_default())
    }

    async fn list_thread_ids(&self) -> Result<Vec<String>, CheckpointError> {
        let guard = self.inner.read().await;
        Ok(guard
            .iter()
            .filter(|(_, h)| !h.is_empty())
            .map(|(id, _)| id.clone())
            .collect())
    }
}
