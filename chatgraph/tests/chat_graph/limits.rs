//! Tool-round cap, model retry and failure handling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chatgraph::graph::TOOL_ROUND_LIMIT_NOTICE;
use chatgraph::{
    ChatError, ChatGraph, CheckpointSource, LlmResponse, MemorySaver, Message, MockLlm,
    ModelError, RetryPolicy, Role, Tool, ToolCall, ToolError, ToolRegistry, ToolSpec,
};
use serde_json::{json, Value};

use crate::common::{calc_call, graph, graph_with, text_response, tool_response, FailingSaves};

/// **Scenario**: A model that always asks for tools is cut off after max_tool_rounds; the last
/// call is offered no tools and the turn ends with a final message.
#[tokio::test]
async fn tool_round_cap_forces_termination() {
    let llm = Arc::new(
        MockLlm::scripted(vec![]).then_repeat(LlmResponse::with_tool_calls(
            "",
            vec![calc_call("loop", 1.0, 1.0, "add")],
        )),
    );
    let graph = graph_with(llm.clone(), Arc::new(MemorySaver::new()), 2);

    let outcome = graph.invoke("capped", "keep going").await.unwrap();

    assert_eq!(outcome.tool_rounds, 2);
    assert_eq!(outcome.final_message, Message::assistant(TOOL_ROUND_LIMIT_NOTICE));
    assert!(!outcome.final_message.has_tool_calls());

    let calls = llm.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].offered_tools.len(), 3);
    assert_eq!(calls[1].offered_tools.len(), 3);
    assert!(calls[2].offered_tools.is_empty());

    // user, (assistant+tools, tool result) x2, forced final
    assert_eq!(outcome.messages.len(), 6);
}

/// **Scenario**: Text that comes with a capped tool request is kept as the final answer.
#[tokio::test]
async fn capped_request_keeps_its_text() {
    let llm = Arc::new(MockLlm::scripted(vec![
        tool_response(vec![calc_call("c1", 1.0, 1.0, "add")]),
        Ok(LlmResponse::with_tool_calls(
            "The sum is 2.",
            vec![calc_call("c2", 2.0, 2.0, "add")],
        )),
    ]));
    let graph = graph_with(llm, Arc::new(MemorySaver::new()), 1);
    let outcome = graph.invoke("t", "sum").await.unwrap();
    assert_eq!(outcome.reply(), "The sum is 2.");
    assert_eq!(outcome.tool_rounds, 1);
}

/// **Scenario**: Unavailable errors are retried; the turn succeeds on the third attempt.
#[tokio::test]
async fn unavailable_is_retried() {
    let llm = Arc::new(MockLlm::scripted(vec![
        Err(ModelError::Unavailable("503".into())),
        Err(ModelError::Unavailable("connection reset".into())),
        text_response("finally"),
    ]));
    let graph = graph(llm.clone());
    let outcome = graph.invoke("retry", "hi").await.unwrap();
    assert_eq!(outcome.reply(), "finally");
    assert_eq!(llm.call_count(), 3);
    assert_eq!(outcome.checkpoint_seq, 1);
}

/// **Scenario**: Exhausted retries fail the turn and write no checkpoint; the previous turn stays.
#[tokio::test]
async fn exhausted_retries_leave_store_untouched() {
    let llm = Arc::new(MockLlm::scripted(vec![
        text_response("first answer"),
        Err(ModelError::Unavailable("down".into())),
        Err(ModelError::Unavailable("down".into())),
        Err(ModelError::Unavailable("down".into())),
    ]));
    let graph = graph(llm.clone());
    graph.invoke("t", "first").await.unwrap();

    let err = graph.invoke("t", "second").await.unwrap_err();
    match err {
        ChatError::ModelUnavailable { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("expected ModelUnavailable, got {:?}", other),
    }
    assert_eq!(llm.call_count(), 4);

    let history = graph.history("t").await.unwrap();
    assert_eq!(
        history,
        vec![Message::user("first"), Message::assistant("first answer")]
    );
    assert_eq!(graph.checkpoints("t").await.unwrap().len(), 1);
}

/// **Scenario**: A model failure after a tool round keeps the completed transitions.
#[tokio::test]
async fn failure_mid_turn_keeps_completed_transitions() {
    let llm = Arc::new(MockLlm::scripted(vec![
        tool_response(vec![calc_call("c1", 3.0, 4.0, "add")]),
        Err(ModelError::InvalidResponse("no choices".into())),
    ]));
    let graph = graph(llm);
    let err = graph.invoke("t", "add 3 and 4").await.unwrap_err();
    assert!(matches!(err, ChatError::InvalidModelResponse(_)));
    // user + assistant(tool call) + tool result were checkpointed.
    assert_eq!(graph.history("t").await.unwrap().len(), 3);
    assert_eq!(graph.checkpoints("t").await.unwrap().len(), 2);
}

/// **Scenario**: A store failure aborts the turn with a checkpoint error.
#[tokio::test]
async fn store_failure_aborts_turn() {
    let llm = Arc::new(MockLlm::scripted(vec![
        tool_response(vec![calc_call("c1", 3.0, 4.0, "add")]),
        text_response("7"),
    ]));
    let store = Arc::new(FailingSaves::new(2));
    let graph = graph_with(llm.clone(), store.clone(), 8);
    let err = graph.invoke("t", "add").await.unwrap_err();
    assert!(matches!(err, ChatError::Checkpoint(_)));
    assert!(err.to_string().contains("disk full"));
    // The model is not called again after the failed tools checkpoint.
    assert_eq!(llm.call_count(), 1);
    assert_eq!(graph.history("t").await.unwrap().len(), 2);
}

/// Hangs on its first call, answers immediately afterwards.
struct HangsOnce {
    hung: AtomicBool,
}

#[async_trait]
impl Tool for HangsOnce {
    fn name(&self) -> &str {
        "lookup"
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "lookup".into(),
            description: None,
            input_schema: json!({"type": "object"}),
        }
    }

    async fn call(&self, _args: Value) -> Result<Value, ToolError> {
        if !self.hung.swap(true, Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        Ok(json!({"found": true}))
    }
}

/// **Scenario**: A turn dropped while its tools run leaves the thread awaiting tools; the next
/// turn answers the pending call before appending the new user message.
#[tokio::test]
async fn dropped_turn_pending_tool_calls_are_answered_on_next_turn() {
    let llm = Arc::new(MockLlm::scripted(vec![
        Ok(LlmResponse::with_tool_calls(
            "",
            vec![ToolCall::new("c1", "lookup", json!({}))],
        )),
        Ok(LlmResponse::text("Found it.")),
    ]));
    let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(HangsOnce {
        hung: AtomicBool::new(false),
    })];
    let graph = ChatGraph::new(llm.clone(), ToolRegistry::with_tools(tools).unwrap())
        .with_retry_policy(RetryPolicy::immediate(1))
        .compile()
        .unwrap();

    let dropped = tokio::time::timeout(Duration::from_millis(100), graph.invoke("t", "first")).await;
    assert!(dropped.is_err());
    let stored = graph.history("t").await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1].tool_calls().len(), 1);

    let outcome = graph.invoke("t", "second").await.unwrap();

    let roles: Vec<Role> = outcome.messages.iter().map(Message::role).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::Tool, Role::User, Role::Assistant]
    );
    match &outcome.messages[2] {
        Message::Tool(result) => {
            assert_eq!(result.call_id, "c1");
            assert!(!result.payload.is_error());
        }
        other => panic!("expected tool result, got {:?}", other),
    }
    assert_eq!(outcome.messages[3], Message::user("second"));
    assert_eq!(outcome.reply(), "Found it.");
    assert_eq!(outcome.tool_rounds, 0);
    // The model saw the answered call plus the new input.
    assert_eq!(llm.calls()[1].history_len, 4);

    let sources: Vec<CheckpointSource> = graph
        .checkpoints("t")
        .await
        .unwrap()
        .iter()
        .map(|c| c.source)
        .collect();
    assert_eq!(
        sources,
        vec![
            CheckpointSource::Model,
            CheckpointSource::Tools,
            CheckpointSource::Model
        ]
    );
}
