//! Streaming: message chunks, update order, terminal events.

use std::collections::HashSet;
use std::sync::Arc;

use chatgraph::{CheckpointSource, MockLlm, ModelError, StreamEvent, StreamMode};
use tokio_stream::StreamExt;

use crate::common::{calc_call, graph, text_response, tool_response};

async fn collect(stream: tokio_stream::wrappers::ReceiverStream<StreamEvent>) -> Vec<StreamEvent> {
    stream.collect().await
}

/// **Scenario**: Message chunks concatenate to the final reply; last event is Completed.
#[tokio::test]
async fn chunks_concatenate_to_final_reply() {
    let graph = graph(Arc::new(MockLlm::with_no_tool_calls(
        "Paris is the capital of France.",
    )));
    let events = collect(graph.stream("s1", "capital of France?", [StreamMode::Messages])).await;

    let text: String = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Messages { chunk, metadata } => {
                assert_eq!(metadata.node, "model");
                Some(chunk.content.as_str())
            }
            _ => None,
        })
        .collect();
    assert_eq!(text, "Paris is the capital of France.");
    assert!(events.iter().filter(|e| e.kind() == "messages").count() > 1);

    match events.last() {
        Some(StreamEvent::Completed { outcome }) => {
            assert_eq!(outcome.reply(), "Paris is the capital of France.")
        }
        other => panic!("expected Completed, got {:?}", other),
    }
}

/// **Scenario**: Updates follow the transitions Model, Tools, Model with increasing seq.
#[tokio::test]
async fn updates_follow_transitions() {
    let llm = Arc::new(MockLlm::scripted(vec![
        tool_response(vec![calc_call("c1", 3.0, 4.0, "add")]),
        text_response("7"),
    ]));
    let graph = graph(llm);
    let events = collect(graph.stream("s2", "add 3 and 4", [StreamMode::Updates])).await;

    let updates: Vec<(CheckpointSource, usize, u64)> = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Updates {
                source,
                appended,
                checkpoint_seq,
            } => Some((*source, appended.len(), *checkpoint_seq)),
            _ => None,
        })
        .collect();
    assert_eq!(
        updates,
        vec![
            (CheckpointSource::Model, 2, 1),
            (CheckpointSource::Tools, 1, 2),
            (CheckpointSource::Model, 1, 3),
        ]
    );
    // Messages mode was not requested.
    assert!(events.iter().all(|e| e.kind() != "messages"));
    assert!(events.last().map(StreamEvent::is_terminal).unwrap_or(false));
}

/// **Scenario**: Values events carry the full history after each transition.
#[tokio::test]
async fn values_carry_full_history() {
    let graph = graph(Arc::new(MockLlm::with_no_tool_calls("hello")));
    graph.invoke("s3", "first").await.unwrap();
    let events = collect(graph.stream("s3", "second", [StreamMode::Values])).await;
    let sizes: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Values { messages } => Some(messages.len()),
            _ => None,
        })
        .collect();
    assert_eq!(sizes, vec![4]);
}

/// **Scenario**: A model failure ends the stream with Failed and nothing after it.
#[tokio::test]
async fn model_failure_ends_with_failed() {
    let llm = Arc::new(MockLlm::scripted(vec![
        Err(ModelError::Unavailable("down".into())),
        Err(ModelError::Unavailable("down".into())),
        Err(ModelError::Unavailable("down".into())),
    ]));
    let graph = graph(llm);
    let events = collect(graph.stream("s4", "hi", StreamMode::all())).await;
    match events.last() {
        Some(StreamEvent::Failed { message }) => assert!(message.contains("3 attempt")),
        other => panic!("expected Failed, got {:?}", other),
    }
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    assert!(graph.history("s4").await.unwrap().is_empty());
}

/// **Scenario**: With no modes selected only the terminal event is delivered.
#[tokio::test]
async fn no_modes_yields_only_terminal_event() {
    let graph = graph(Arc::new(MockLlm::with_no_tool_calls("ok")));
    let events = collect(graph.stream("s5", "hi", HashSet::<StreamMode>::new())).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), "completed");
}

/// **Scenario**: Events serialize with a snake_case `event` tag for SSE clients.
#[tokio::test]
async fn events_serialize_with_tag() {
    let graph = graph(Arc::new(MockLlm::with_no_tool_calls("ok")));
    let events = collect(graph.stream("s6", "hi", [StreamMode::Updates])).await;
    let first = serde_json::to_value(&events[0]).unwrap();
    assert_eq!(first["event"], "updates");
    assert_eq!(first["source"], "model");
    let last = serde_json::to_value(events.last().unwrap()).unwrap();
    assert_eq!(last["event"], "completed");
}
