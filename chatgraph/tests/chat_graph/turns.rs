//! Turns: tool round-trip, replayed history, unknown threads, multi-turn growth.

use std::sync::Arc;

use chatgraph::{CheckpointSource, Message, MockLlm, ToolPayload};
use serde_json::json;

use crate::common::{calc_call, graph, text_response, tool_response};

/// **Scenario**: "add 3 and 4" → tool call, result 7, final answer; 4 messages in the thread.
#[tokio::test]
async fn add_three_and_four_ends_with_four_messages() {
    let llm = Arc::new(MockLlm::scripted(vec![
        tool_response(vec![calc_call("c1", 3.0, 4.0, "add")]),
        text_response("3 + 4 = 7"),
    ]));
    let graph = graph(llm.clone());

    let outcome = graph.invoke("thread-add", "add 3 and 4").await.unwrap();

    assert_eq!(outcome.messages.len(), 4);
    assert_eq!(outcome.tool_rounds, 1);
    assert_eq!(outcome.reply(), "3 + 4 = 7");

    let history = graph.history("thread-add").await.unwrap();
    assert_eq!(history, outcome.messages);
    assert_eq!(history[0], Message::user("add 3 and 4"));
    assert_eq!(history[1].tool_calls().len(), 1);
    match &history[2] {
        Message::Tool(result) => {
            assert_eq!(result.call_id, "c1");
            match &result.payload {
                ToolPayload::Success { result } => assert_eq!(result["result"], json!(7.0)),
                other => panic!("expected success, got {:?}", other),
            }
        }
        other => panic!("expected tool message, got {:?}", other),
    }
    assert_eq!(history[3], Message::assistant("3 + 4 = 7"));

    // Second model call saw the whole history including the tool result.
    assert_eq!(llm.calls()[1].history_len, 3);
}

/// **Scenario**: Final message is visible via history right after invoke returns.
#[tokio::test]
async fn final_message_is_immediately_visible() {
    let graph = graph(Arc::new(MockLlm::with_no_tool_calls("Hi!")));
    let outcome = graph.invoke("t", "hello").await.unwrap();
    let history = graph.history("t").await.unwrap();
    assert_eq!(history.last(), Some(&outcome.final_message));
    assert_eq!(outcome.checkpoint_seq, 1);
}

/// **Scenario**: N turns on one thread accumulate; replayed history equals the stored one.
#[tokio::test]
async fn replayed_history_matches_after_several_turns() {
    let graph = graph(Arc::new(MockLlm::with_no_tool_calls("ok")));
    let mut replayed = Vec::new();
    for i in 0..4 {
        let input = format!("message {}", i);
        let outcome = graph.invoke("multi", input.clone()).await.unwrap();
        replayed.push(Message::user(input));
        replayed.push(outcome.final_message.clone());
        assert_eq!(outcome.messages, replayed);
    }
    assert_eq!(graph.history("multi").await.unwrap(), replayed);

    let checkpoints = graph.checkpoints("multi").await.unwrap();
    assert_eq!(
        checkpoints.iter().map(|c| c.seq).collect::<Vec<_>>(),
        vec![1, 2, 3, 4]
    );
    assert!(checkpoints
        .iter()
        .all(|c| c.source == CheckpointSource::Model));
}

/// **Scenario**: Unknown thread has empty history and no checkpoints.
#[tokio::test]
async fn unknown_thread_is_empty() {
    let graph = graph(Arc::new(MockLlm::with_no_tool_calls("ok")));
    assert!(graph.history("never-used").await.unwrap().is_empty());
    assert!(graph.checkpoints("never-used").await.unwrap().is_empty());
}

/// **Scenario**: Threads never share messages.
#[tokio::test]
async fn threads_are_isolated() {
    let graph = graph(Arc::new(MockLlm::with_no_tool_calls("ok")));
    graph.invoke("a", "first thread").await.unwrap();
    graph.invoke("b", "second thread").await.unwrap();
    assert_eq!(
        graph.history("a").await.unwrap()[0],
        Message::user("first thread")
    );
    assert_eq!(
        graph.history("b").await.unwrap()[0],
        Message::user("second thread")
    );
    assert_eq!(graph.history("a").await.unwrap().len(), 2);
}
