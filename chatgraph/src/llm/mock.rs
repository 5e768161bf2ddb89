//! Scripted LLM client for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::message::Message;
use crate::stream::MessageChunk;
use crate::tools::ToolSpec;

use super::{LlmClient, LlmResponse, ModelError};

/// Mock LLM: replays a script of responses (or errors) in order.
///
/// When the script is exhausted the `fallback` response is repeated; without a fallback the call
/// fails with `InvalidResponse`. Records what each call saw so tests can assert on it.
///
/// **Interaction**: Implements `LlmClient`; used by graph tests, CLI tests and the server tests.
#[derive(Debug, Default)]
pub struct MockLlm {
    script: Mutex<VecDeque<Result<LlmResponse, ModelError>>>,
    fallback: Option<LlmResponse>,
    calls: Mutex<Vec<MockCall>>,
}

/// What one `invoke` call received.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub history_len: usize,
    pub offered_tools: Vec<String>,
}

impl MockLlm {
    /// Always answers `content` with no tool calls.
    pub fn with_no_tool_calls(content: impl Into<String>) -> Self {
        Self {
            fallback: Some(LlmResponse::text(content)),
            ..Self::default()
        }
    }

    /// Replays `script` in order.
    pub fn scripted(script: Vec<Result<LlmResponse, ModelError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    /// Repeats `response` after the script runs out (builder style).
    pub fn then_repeat(mut self, response: LlmResponse) -> Self {
        self.fallback = Some(response);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn next_response(&self) -> Result<LlmResponse, ModelError> {
        let scripted = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match scripted {
            Some(r) => r,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| ModelError::InvalidResponse("mock script exhausted".to_string())),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<LlmResponse, ModelError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(MockCall {
                history_len: messages.len(),
                offered_tools: tools.iter().map(|t| t.name.clone()).collect(),
            });
        self.next_response()
    }

    /// Emits the content word by word (whitespace kept) to mimic token streaming.
    async fn invoke_stream(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        chunk_tx: Option<mpsc::Sender<MessageChunk>>,
    ) -> Result<LlmResponse, ModelError> {
        let response = self.invoke(messages, tools).await?;
        if let Some(tx) = chunk_tx {
            for piece in response.content.split_inclusive(' ') {
                let _ = tx
                    .send(MessageChunk {
                        content: piece.to_string(),
                    })
                    .await;
            }
        }
        Ok(response)
    }
}
