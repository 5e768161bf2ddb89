//! Tool batches routed through the graph: ordering and per-call error containment.

use std::sync::Arc;

use chatgraph::{Message, MockLlm, ToolCall, ToolErrorKind, ToolPayload};
use serde_json::json;

use crate::common::{calc_call, graph, text_response, tool_response};

fn tool_results(history: &[Message]) -> Vec<&chatgraph::ToolResult> {
    history
        .iter()
        .filter_map(|m| match m {
            Message::Tool(r) => Some(r),
            _ => None,
        })
        .collect()
}

/// **Scenario**: Batch of 3 with an unknown tool in slot 2 yields 3 ordered results, slot 2 an
/// error payload; the turn still completes.
#[tokio::test]
async fn unknown_tool_in_batch_is_contained() {
    let llm = Arc::new(MockLlm::scripted(vec![
        tool_response(vec![
            calc_call("c1", 1.0, 2.0, "add"),
            ToolCall::new("c2", "does_not_exist", json!({})),
            ToolCall::new("c3", "echo", json!({"x": 1})),
        ]),
        text_response("done"),
    ]));
    let graph = graph(llm);

    let outcome = graph.invoke("batch", "go").await.unwrap();
    let results = tool_results(&outcome.messages);

    assert_eq!(
        results.iter().map(|r| r.call_id.as_str()).collect::<Vec<_>>(),
        vec!["c1", "c2", "c3"]
    );
    assert!(!results[0].payload.is_error());
    match &results[1].payload {
        ToolPayload::Error { kind, message } => {
            assert_eq!(*kind, ToolErrorKind::UnknownTool);
            assert!(message.contains("does_not_exist"));
        }
        other => panic!("expected error payload, got {:?}", other),
    }
    assert_eq!(
        results[2].payload,
        ToolPayload::Success {
            result: json!({"x": 1})
        }
    );
    assert_eq!(outcome.reply(), "done");
}

/// **Scenario**: Execution failures and invalid input become error payloads the model sees.
#[tokio::test]
async fn failing_tools_become_error_payloads() {
    let llm = Arc::new(MockLlm::scripted(vec![
        tool_response(vec![
            ToolCall::new("b1", "broken", json!({})),
            calc_call("d1", 1.0, 0.0, "div"),
            ToolCall::new("m1", "calculator", json!({"operation": "add"})),
        ]),
        text_response("sorry"),
    ]));
    let graph = graph(llm.clone());

    let outcome = graph.invoke("failures", "try").await.unwrap();
    let kinds: Vec<ToolErrorKind> = tool_results(&outcome.messages)
        .into_iter()
        .map(|r| match &r.payload {
            ToolPayload::Error { kind, .. } => *kind,
            other => panic!("expected error payload, got {:?}", other),
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            ToolErrorKind::Execution,
            ToolErrorKind::Execution,
            ToolErrorKind::InvalidInput
        ]
    );
    assert_eq!(llm.calls()[1].history_len, 5);
}
