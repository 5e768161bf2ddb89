//! Phases of one conversation turn and the outcome of a completed turn.

use serde::Serialize;

use crate::message::Message;

use super::turn::TurnResult;

/// Where a turn is in its run: `AwaitingModel → (AwaitingTools → AwaitingModel)* → Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Initial: the model is called with the full history.
    AwaitingModel,
    /// The model asked for tools; the dispatcher runs them next.
    AwaitingTools,
    /// Terminal: a final assistant message was appended.
    Done,
}

impl Phase {
    /// Routing after a model step. Depends only on whether tool calls were requested.
    pub fn after_model(result: &TurnResult) -> Phase {
        match result {
            TurnResult::Final(_) => Phase::Done,
            TurnResult::ToolCallRequested { .. } => Phase::AwaitingTools,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Done)
    }
}

/// Result of a completed turn.
///
/// **Interaction**: Returned by `CompiledChatGraph::invoke`, carried by `StreamEvent::Completed`,
/// serialized as the JSON body of a non-streaming `POST /threads/{id}/messages`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub thread_id: String,
    /// Full thread history after the turn (equals `history(thread_id)`).
    pub messages: Vec<Message>,
    /// The assistant message that ended the turn.
    pub final_message: Message,
    /// Tool round-trips completed in this turn.
    pub tool_rounds: usize,
    /// Seq of the checkpoint written by the last transition.
    pub checkpoint_seq: u64,
}

impl TurnOutcome {
    /// Text of the final answer.
    pub fn reply(&self) -> std::borrow::Cow<'_, str> {
        self.final_message.content()
    }
}
