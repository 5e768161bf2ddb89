//! Compiled chat graph: immutable, supports invoke and stream.
//!
//! Built by `ChatGraph::compile` or `compile_with_checkpointer`. One run loop drives both entry
//! points; every transition is checkpointed before the next phase starts.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::ChatError;
use crate::memory::{CheckpointListItem, CheckpointSource, Checkpointer, ThreadCatalog};
use crate::message::{Message, ToolCall};
use crate::stream::{MessageChunk, StreamEvent, StreamMetadata, StreamMode};
use crate::tools::{ToolDispatcher, ToolRegistry, ToolSpec};

use super::locks::ThreadLocks;
use super::logging;
use super::turn::{TurnExecutor, TurnResult};
use super::{Phase, RetryPolicy, RunContext, TurnOutcome};

/// Appended when the model keeps requesting tools past the cap and gives no text.
pub const TOOL_ROUND_LIMIT_NOTICE: &str =
    "I could not finish within the allowed number of tool calls for this turn.";

/// Compiled graph: immutable structure, cheap to clone (shared handles).
///
/// Created by `ChatGraph::compile()` or `compile_with_checkpointer()`. Runs
/// `AwaitingModel → (AwaitingTools → AwaitingModel)* → Done` for each turn, saving a checkpoint
/// after every transition.
#[derive(Clone)]
pub struct CompiledChatGraph {
    pub(super) executor: TurnExecutor,
    pub(super) dispatcher: ToolDispatcher,
    pub(super) checkpointer: Arc<dyn Checkpointer>,
    pub(super) max_tool_rounds: usize,
    pub(super) retry: RetryPolicy,
    pub(super) locks: Arc<ThreadLocks>,
}

/// Mutable state of one turn while the loop runs.
struct TurnState {
    messages: Vec<Message>,
    /// Number of leading messages already in the store.
    persisted: usize,
    tool_rounds: usize,
    checkpoint_seq: u64,
}

impl CompiledChatGraph {
    /// Shared run loop used by invoke() and stream().
    async fn run_turn(
        &self,
        thread_id: &str,
        input: String,
        run_ctx: Option<&RunContext>,
    ) -> Result<TurnOutcome, ChatError> {
        if thread_id.trim().is_empty() {
            return Err(ChatError::EmptyThreadId);
        }
        let _guard = self.locks.acquire(thread_id).await;

        let messages = self.checkpointer.load_latest(thread_id).await?;
        let persisted = messages.len();
        logging::log_turn_start(thread_id, persisted);

        let mut turn = TurnState {
            messages,
            persisted,
            tool_rounds: 0,
            checkpoint_seq: 0,
        };
        // A turn dropped after its model step leaves the thread in AwaitingTools; finish that
        // step first so every tool call is answered before the new input.
        let unanswered = unanswered_tool_calls(&turn.messages);
        if !unanswered.is_empty() {
            logging::log_resume_tools(thread_id, unanswered.len());
            self.run_tools(thread_id, &mut turn, &unanswered, 0, run_ctx)
                .await?;
        }
        // Not saved on its own: it goes into the store with the first model transition.
        turn.messages.push(Message::user(input));

        let tools = self.dispatcher.registry().describe_all();
        let mut phase = Phase::AwaitingModel;
        let mut pending: Vec<ToolCall> = Vec::new();

        while !phase.is_terminal() {
            phase = match phase {
                Phase::AwaitingModel => {
                    let capped = turn.tool_rounds >= self.max_tool_rounds;
                    let offered: &[ToolSpec] = if capped { &[] } else { &tools };
                    let result = self
                        .call_model(thread_id, &turn.messages, offered, run_ctx)
                        .await?;
                    logging::log_model_step(
                        thread_id,
                        turn.tool_rounds,
                        result.message().tool_calls().len(),
                        offered.len(),
                    );
                    let next = Phase::after_model(&result);
                    let message = match result {
                        TurnResult::Final(message) => message,
                        TurnResult::ToolCallRequested { message, calls } if capped => {
                            logging::log_round_cap(thread_id, self.max_tool_rounds, calls.len());
                            forced_final(&message)
                        }
                        TurnResult::ToolCallRequested { message, calls } => {
                            pending = calls;
                            message
                        }
                    };
                    turn.messages.push(message);
                    self.checkpoint(thread_id, &mut turn, CheckpointSource::Model, run_ctx)
                        .await?;
                    if capped {
                        Phase::Done
                    } else {
                        next
                    }
                }
                Phase::AwaitingTools => {
                    let calls = std::mem::take(&mut pending);
                    turn.tool_rounds += 1;
                    let round = turn.tool_rounds;
                    self.run_tools(thread_id, &mut turn, &calls, round, run_ctx)
                        .await?;
                    Phase::AwaitingModel
                }
                Phase::Done => Phase::Done,
            };
        }

        let final_message = turn
            .messages
            .last()
            .cloned()
            .ok_or_else(|| ChatError::InvalidModelResponse("turn ended without a reply".into()))?;
        logging::log_turn_complete(thread_id, turn.checkpoint_seq, turn.tool_rounds);
        Ok(TurnOutcome {
            thread_id: thread_id.to_string(),
            messages: turn.messages,
            final_message,
            tool_rounds: turn.tool_rounds,
            checkpoint_seq: turn.checkpoint_seq,
        })
    }

    /// One model step with retry. Only `ModelError::Unavailable` is retried.
    async fn call_model(
        &self,
        thread_id: &str,
        history: &[Message],
        tools: &[ToolSpec],
        run_ctx: Option<&RunContext>,
    ) -> Result<TurnResult, ChatError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let result = match run_ctx.filter(|ctx| ctx.wants(StreamMode::Messages)) {
                Some(ctx) => self.call_model_streaming(history, tools, ctx).await,
                None => self.executor.execute(history, tools).await,
            };
            match result {
                Ok(r) => return Ok(r),
                Err(e) if e.is_retryable() && self.retry.should_retry(attempt) => {
                    let delay = self.retry.delay(attempt);
                    logging::log_retry(thread_id, attempt, delay, &e);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(ChatError::from_model(e, attempt)),
            }
        }
    }

    /// Dispatches one batch, appends the results in call order and checkpoints them.
    async fn run_tools(
        &self,
        thread_id: &str,
        turn: &mut TurnState,
        calls: &[ToolCall],
        round: usize,
        run_ctx: Option<&RunContext>,
    ) -> Result<(), ChatError> {
        let results = self.dispatcher.dispatch(calls).await;
        let failures = results.iter().filter(|r| r.payload.is_error()).count();
        logging::log_tools_step(thread_id, round, results.len(), failures);
        turn.messages.extend(results.into_iter().map(Message::Tool));
        self.checkpoint(thread_id, turn, CheckpointSource::Tools, run_ctx)
            .await
    }

    /// Streams chunks as `StreamEvent::Messages` while the model call runs.
    async fn call_model_streaming(
        &self,
        history: &[Message],
        tools: &[ToolSpec],
        ctx: &RunContext,
    ) -> Result<TurnResult, crate::llm::ModelError> {
        let (chunk_tx, mut chunk_rx) = mpsc::channel::<MessageChunk>(128);
        let forward = async {
            while let Some(chunk) = chunk_rx.recv().await {
                ctx.emit(
                    StreamMode::Messages,
                    StreamEvent::Messages {
                        chunk,
                        metadata: StreamMetadata {
                            node: "model".to_string(),
                        },
                    },
                )
                .await;
            }
        };
        // chunk_tx moves into the call and is dropped when it returns, ending `forward`.
        let (result, ()) = tokio::join!(
            self.executor.execute_streaming(history, tools, Some(chunk_tx)),
            forward
        );
        result
    }

    /// Saves the full history and emits Updates/Values for the newly persisted messages.
    async fn checkpoint(
        &self,
        thread_id: &str,
        turn: &mut TurnState,
        source: CheckpointSource,
        run_ctx: Option<&RunContext>,
    ) -> Result<(), ChatError> {
        let checkpoint = self
            .checkpointer
            .save(thread_id, &turn.messages, source)
            .await?;
        logging::log_checkpoint(thread_id, checkpoint.seq, turn.messages.len());
        let appended = turn.messages[turn.persisted..].to_vec();
        turn.persisted = turn.messages.len();
        turn.checkpoint_seq = checkpoint.seq;

        if let Some(ctx) = run_ctx {
            ctx.emit(
                StreamMode::Updates,
                StreamEvent::Updates {
                    source,
                    appended,
                    checkpoint_seq: checkpoint.seq,
                },
            )
            .await;
            ctx.emit(
                StreamMode::Values,
                StreamEvent::Values {
                    messages: turn.messages.clone(),
                },
            )
            .await;
        }
        Ok(())
    }

    /// Runs one turn: appends `input` as a user message and drives the thread to Done.
    ///
    /// Turns on the same thread are serialized; a failed turn leaves the thread at its last
    /// completed transition.
    pub async fn invoke(
        &self,
        thread_id: &str,
        input: impl Into<String>,
    ) -> Result<TurnOutcome, ChatError> {
        let result = self.run_turn(thread_id, input.into(), None).await;
        if let Err(ref e) = result {
            logging::log_turn_error(thread_id, e);
        }
        result
    }

    /// Streams a turn, emitting events for the selected modes. The stream always ends with
    /// `Completed` or `Failed`.
    pub fn stream(
        &self,
        thread_id: impl Into<String>,
        input: impl Into<String>,
        stream_mode: impl Into<HashSet<StreamMode>>,
    ) -> ReceiverStream<StreamEvent> {
        let (tx, rx) = mpsc::channel(128);
        let graph = self.clone();
        let thread_id = thread_id.into();
        let input = input.into();
        let run_ctx = RunContext::new(tx, stream_mode.into());

        tokio::spawn(async move {
            let terminal = match graph.run_turn(&thread_id, input, Some(&run_ctx)).await {
                Ok(outcome) => StreamEvent::Completed { outcome },
                Err(e) => {
                    logging::log_turn_error(&thread_id, &e);
                    StreamEvent::Failed {
                        message: e.to_string(),
                    }
                }
            };
            run_ctx.finish(terminal).await;
        });

        ReceiverStream::new(rx)
    }

    /// Latest history for the thread; empty for an unknown thread.
    pub async fn history(&self, thread_id: &str) -> Result<Vec<Message>, ChatError> {
        Ok(self.checkpointer.load_latest(thread_id).await?)
    }

    /// Checkpoint list for the thread, ascending seq.
    pub async fn checkpoints(&self, thread_id: &str) -> Result<Vec<CheckpointListItem>, ChatError> {
        Ok(self.checkpointer.list(thread_id).await?)
    }

    pub fn catalog(&self) -> ThreadCatalog {
        ThreadCatalog::new(Arc::clone(&self.checkpointer))
    }

    pub fn checkpointer(&self) -> &Arc<dyn Checkpointer> {
        &self.checkpointer
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        self.dispatcher.registry()
    }

    pub fn max_tool_rounds(&self) -> usize {
        self.max_tool_rounds
    }
}

impl std::fmt::Debug for CompiledChatGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledChatGraph")
            .field("tools", &self.registry().names())
            .field("max_tool_rounds", &self.max_tool_rounds)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

/// Drops the tool calls of a capped request, keeping its text.
fn forced_final(message: &Message) -> Message {
    let text = message.content();
    if text.trim().is_empty() {
        Message::assistant(TOOL_ROUND_LIMIT_NOTICE)
    } else {
        Message::assistant(text.into_owned())
    }
}

/// Tool calls of a trailing assistant message; its results are always saved right after it, so
/// a trailing request has none.
fn unanswered_tool_calls(messages: &[Message]) -> Vec<ToolCall> {
    messages
        .last()
        .map(|m| m.tool_calls().to_vec())
        .unwrap_or_default()
}
