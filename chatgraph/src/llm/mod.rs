//! LLM client abstraction for the chat step.
//!
//! The chat step depends on a callable that takes the thread history plus the tool specs and
//! returns assistant text and optional tool calls. This module defines the trait, the error type
//! and a scripted mock; `ChatOpenAI` is available with feature `openai`.

mod mock;

#[cfg(feature = "openai")]
mod openai;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::message::{Message, ToolCall};
use crate::stream::MessageChunk;
use crate::tools::ToolSpec;

pub use mock::MockLlm;

#[cfg(feature = "openai")]
pub use openai::ChatOpenAI;

/// Tool choice mode for chat completions: when tools are present, controls whether
/// the model may choose (auto), must not use (none), or must use (required).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ToolChoiceMode {
    /// Model can pick between message or tool calls. Default when tools are present.
    #[default]
    Auto,
    /// Model will not call any tool.
    None,
    /// Model must call one or more tools.
    Required,
}

impl std::str::FromStr for ToolChoiceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "none" => Ok(Self::None),
            "required" => Ok(Self::Required),
            _ => Err(format!(
                "unknown tool_choice: {} (use auto, none, or required)",
                s
            )),
        }
    }
}

/// Failure of a single model call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    /// Network or service fault; the caller may retry.
    #[error("model unavailable: {0}")]
    Unavailable(String),
    /// The call completed but the answer is unusable; retrying will not help.
    #[error("invalid model response: {0}")]
    InvalidResponse(String),
}

impl ModelError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ModelError::Unavailable(_))
    }
}

/// Response from an LLM completion: assistant text and optional tool calls.
///
/// **Interaction**: Returned by `LlmClient::invoke()`; the turn executor turns it into a
/// `TurnResult` (final when `tool_calls` is empty).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LlmResponse {
    /// Assistant message content (plain text).
    pub content: String,
    /// Tool calls from this turn; empty means a final answer.
    pub tool_calls: Vec<ToolCall>,
}

impl LlmResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
        }
    }
}

/// LLM client: given history and tool specs, returns assistant text and optional tool calls.
///
/// Implementations make exactly one attempt per call; retries belong to the chat graph.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// One model call over the full history. An empty `tools` slice offers no tools.
    async fn invoke(&self, messages: &[Message], tools: &[ToolSpec])
        -> Result<LlmResponse, ModelError>;

    /// Streaming variant: sends text chunks through `chunk_tx` while the call is in flight and
    /// returns the complete response. The default sends the whole content as one chunk.
    async fn invoke_stream(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        chunk_tx: Option<mpsc::Sender<MessageChunk>>,
    ) -> Result<LlmResponse, ModelError> {
        let response = self.invoke(messages, tools).await?;
        if let Some(tx) = chunk_tx {
            if !response.content.is_empty() {
                let _ = tx
                    .send(MessageChunk {
                        content: response.content.clone(),
                    })
                    .await;
            }
        }
        Ok(response)
    }
}
