//! Run context for streaming-aware turns.
//!
//! Holds the optional stream sender plus selected stream modes.

use std::collections::HashSet;

use tokio::sync::mpsc;

use crate::stream::{StreamEvent, StreamMode};

#[derive(Clone, Debug)]
pub struct RunContext {
    /// Sender for streaming events; a closed receiver is ignored.
    pub stream_tx: mpsc::Sender<StreamEvent>,
    /// Enabled stream modes (Values, Updates, Messages).
    pub stream_mode: HashSet<StreamMode>,
}

impl RunContext {
    pub fn new(stream_tx: mpsc::Sender<StreamEvent>, stream_mode: HashSet<StreamMode>) -> Self {
        Self {
            stream_tx,
            stream_mode,
        }
    }

    pub fn wants(&self, mode: StreamMode) -> bool {
        self.stream_mode.contains(&mode)
    }

    /// Sends `event` if `mode` is enabled.
    pub async fn emit(&self, mode: StreamMode, event: StreamEvent) {
        if self.wants(mode) {
            let _ = self.stream_tx.send(event).await;
        }
    }

    /// Sends a terminal event; always delivered regardless of modes.
    pub async fn finish(&self, event: StreamEvent) {
        let _ = self.stream_tx.send(event).await;
    }
}
