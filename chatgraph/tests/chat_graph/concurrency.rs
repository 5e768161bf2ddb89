//! Same-thread serialization and concurrent saves.

use std::sync::Arc;
use std::time::Duration;

use chatgraph::tools::CalculatorTool;
use chatgraph::{
    ChatGraph, CheckpointError, CheckpointSource, Checkpointer, LlmResponse, MemorySaver, Message,
    MockLlm, Role, Tool, ToolCall, ToolRegistry,
};
use serde_json::json;

use crate::common::EchoTool;

/// Appends one message with load/save, retrying on conflict.
async fn append_with_retry(store: Arc<dyn Checkpointer>, thread_id: &str, text: String) {
    loop {
        let mut messages = store.load_latest(thread_id).await.unwrap();
        messages.push(Message::user(text.clone()));
        match store.save(thread_id, &messages, CheckpointSource::Model).await {
            Ok(_) => return,
            Err(CheckpointError::Conflict { .. }) => tokio::task::yield_now().await,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
}

async fn assert_no_lost_update(store: Arc<dyn Checkpointer>) {
    let writers = 10;
    let handles: Vec<_> = (0..writers)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { append_with_retry(store, "shared", format!("w{}", i)).await })
        })
        .collect();
    for h in handles {
        h.await.unwrap();
    }

    let history = store.load_latest("shared").await.unwrap();
    assert_eq!(history.len(), writers);
    let mut texts: Vec<String> = history.iter().map(|m| m.content().into_owned()).collect();
    texts.sort();
    let mut expected: Vec<String> = (0..writers).map(|i| format!("w{}", i)).collect();
    expected.sort();
    assert_eq!(texts, expected);

    let seqs: Vec<u64> = store
        .list("shared")
        .await
        .unwrap()
        .iter()
        .map(|c| c.seq)
        .collect();
    assert_eq!(seqs, (1..=writers as u64).collect::<Vec<_>>());
}

/// **Scenario**: Concurrent writers on one thread never lose an update (MemorySaver).
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_saves_memory_saver() {
    assert_no_lost_update(Arc::new(MemorySaver::new())).await;
}

/// **Scenario**: Concurrent writers on one thread never lose an update (SqliteSaver).
#[cfg(feature = "sqlite")]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_saves_sqlite_saver() {
    let dir = tempfile::tempdir().unwrap();
    let saver = chatgraph::SqliteSaver::new(dir.path().join("c.db")).unwrap();
    assert_no_lost_update(Arc::new(saver)).await;
}

/// **Scenario**: Two turns started together on one thread run one after the other; the history
/// alternates user/assistant and each turn saw the previous one.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn same_thread_turns_are_serialized() {
    let slow = EchoTool {
        name: "slow",
        delay: Duration::from_millis(30),
    };
    let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(slow), Arc::new(CalculatorTool)];
    let llm = Arc::new(MockLlm::scripted(vec![
        Ok(LlmResponse::with_tool_calls(
            "",
            vec![ToolCall::new("s1", "slow", json!({}))],
        )),
        Ok(LlmResponse::text("first done")),
        Ok(LlmResponse::with_tool_calls(
            "",
            vec![ToolCall::new("s2", "slow", json!({}))],
        )),
        Ok(LlmResponse::text("second done")),
    ]));
    let graph = ChatGraph::new(llm.clone(), ToolRegistry::with_tools(tools).unwrap())
        .compile()
        .unwrap();

    let (a, b) = tokio::join!(graph.invoke("same", "one"), graph.invoke("same", "two"));
    a.unwrap();
    b.unwrap();

    let history = graph.history("same").await.unwrap();
    assert_eq!(history.len(), 8);
    let roles: Vec<Role> = history.iter().map(Message::role).collect();
    assert_eq!(
        roles,
        vec![
            Role::User,
            Role::Assistant,
            Role::Tool,
            Role::Assistant,
            Role::User,
            Role::Assistant,
            Role::Tool,
            Role::Assistant
        ]
    );
    // The second turn's first model call saw the whole first turn plus its own input.
    assert_eq!(llm.calls()[2].history_len, 5);
}

/// **Scenario**: Turns on different threads run concurrently and stay separate.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn different_threads_run_concurrently() {
    let graph = ChatGraph::new(
        Arc::new(MockLlm::with_no_tool_calls("ok")),
        ToolRegistry::new(),
    )
    .compile()
    .unwrap();
    let turns: Vec<_> = (0..8)
        .map(|i| {
            let graph = graph.clone();
            tokio::spawn(async move { graph.invoke(&format!("t{}", i), "hi").await })
        })
        .collect();
    for t in turns {
        assert_eq!(t.await.unwrap().unwrap().messages.len(), 2);
    }
    let listing = graph.catalog().all_threads().await;
    assert_eq!(listing.thread_ids.len(), 8);
}
