//! Logging utilities for chat turns.
//!
//! Structured `tracing` events for turn start/end, model and tool steps, retries and failures.

use std::time::Duration;

use crate::error::ChatError;
use crate::llm::ModelError;

pub fn log_turn_start(thread_id: &str, history_len: usize) {
    tracing::info!(thread_id, history_len, "Starting turn");
}

pub fn log_model_step(thread_id: &str, round: usize, tool_calls: usize, offered_tools: usize) {
    tracing::debug!(
        thread_id,
        round,
        tool_calls,
        offered_tools,
        "Model step complete"
    );
}

pub fn log_tools_step(thread_id: &str, round: usize, results: usize, failures: usize) {
    tracing::debug!(thread_id, round, results, failures, "Tool step complete");
}

/// The stored history ended with tool calls that never got results.
pub fn log_resume_tools(thread_id: &str, pending_calls: usize) {
    tracing::warn!(
        thread_id,
        pending_calls,
        "Thread was left awaiting tools, dispatching pending calls"
    );
}

pub fn log_checkpoint(thread_id: &str, seq: u64, message_count: usize) {
    tracing::trace!(thread_id, seq, message_count, "Checkpoint saved");
}

/// The model kept asking for tools after the cap; the request was dropped.
pub fn log_round_cap(thread_id: &str, max_tool_rounds: usize, dropped_calls: usize) {
    tracing::warn!(
        thread_id,
        max_tool_rounds,
        dropped_calls,
        "Tool round limit reached, forcing final answer"
    );
}

pub fn log_retry(thread_id: &str, attempt: u32, delay: Duration, error: &ModelError) {
    tracing::warn!(
        thread_id,
        attempt,
        delay_ms = delay.as_millis() as u64,
        %error,
        "Model call failed, retrying"
    );
}

pub fn log_turn_complete(thread_id: &str, checkpoint_seq: u64, tool_rounds: usize) {
    tracing::info!(thread_id, checkpoint_seq, tool_rounds, "Turn complete");
}

pub fn log_turn_error(thread_id: &str, error: &ChatError) {
    tracing::error!(thread_id, %error, "Turn failed");
}
