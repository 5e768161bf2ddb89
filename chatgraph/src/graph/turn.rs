//! Turn executor: one model call over the history, classified into a `TurnResult`.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::llm::{LlmClient, LlmResponse, ModelError};
use crate::message::{Message, ToolCall};
use crate::stream::MessageChunk;
use crate::tools::ToolSpec;

/// What the model produced for this step.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnResult {
    /// Assistant message without tool calls; ends the turn.
    Final(Message),
    /// Assistant message carrying `calls` (also present inside `message`).
    ToolCallRequested {
        message: Message,
        calls: Vec<ToolCall>,
    },
}

impl TurnResult {
    /// Classifies a response. Calls without an id get a generated one so results can reference
    /// them.
    pub fn from_response(response: LlmResponse) -> Self {
        if response.tool_calls.is_empty() {
            return TurnResult::Final(Message::assistant(response.content));
        }
        let calls: Vec<ToolCall> = response
            .tool_calls
            .into_iter()
            .map(|mut c| {
                if c.id.is_empty() {
                    c.id = format!("call_{}", uuid::Uuid::new_v4().simple());
                }
                c
            })
            .collect();
        TurnResult::ToolCallRequested {
            message: Message::assistant_with_tool_calls(response.content, calls.clone()),
            calls,
        }
    }

    pub fn message(&self) -> &Message {
        match self {
            TurnResult::Final(m) => m,
            TurnResult::ToolCallRequested { message, .. } => message,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, TurnResult::Final(_))
    }
}

/// Invokes the model with the accumulated history and the offered tool descriptors.
///
/// Exactly one attempt per call; retry belongs to the chat graph.
///
/// **Interaction**: Owned by `CompiledChatGraph`; wraps an `LlmClient`.
#[derive(Clone)]
pub struct TurnExecutor {
    llm: Arc<dyn LlmClient>,
}

impl TurnExecutor {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn execute(
        &self,
        history: &[Message],
        tools: &[ToolSpec],
    ) -> Result<TurnResult, ModelError> {
        let response = self.llm.invoke(history, tools).await?;
        Ok(TurnResult::from_response(response))
    }

    /// Like [`execute`](Self::execute) but forwards text chunks through `chunk_tx` while the call
    /// is in flight. The sender is dropped when the call returns.
    pub async fn execute_streaming(
        &self,
        history: &[Message],
        tools: &[ToolSpec],
        chunk_tx: Option<mpsc::Sender<MessageChunk>>,
    ) -> Result<TurnResult, ModelError> {
        let response = self.llm.invoke_stream(history, tools, chunk_tx).await?;
        Ok(TurnResult::from_response(response))
    }
}

impl std::fmt::Debug for TurnExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnExecutor").finish_non_exhaustive()
    }
}
