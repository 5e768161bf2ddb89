//! SQLite persistence through the graph and the thread catalog.

#![cfg(feature = "sqlite")]

use std::sync::Arc;

use chatgraph::memory::UNTITLED_THREAD;
use chatgraph::{
    build_chat_graph_with_llm, ChatBuildConfig, Checkpointer, MockLlm, SqliteSaver,
};

use crate::common::{calc_call, graph_with, text_response, tool_response};

/// **Scenario**: A thread written through one graph is fully replayed by a new graph on the same
/// database file.
#[tokio::test]
async fn history_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("threads").join("chat.db");

    let first_outcome = {
        let llm = Arc::new(MockLlm::scripted(vec![
            tool_response(vec![calc_call("c1", 3.0, 4.0, "add")]),
            text_response("3 + 4 = 7"),
        ]));
        let saver = Arc::new(SqliteSaver::new(&path).unwrap());
        let graph = graph_with(llm, saver, 8);
        graph.invoke("persisted", "add 3 and 4").await.unwrap()
    };

    let llm = Arc::new(MockLlm::with_no_tool_calls("You asked me to add."));
    let saver = Arc::new(SqliteSaver::new(&path).unwrap());
    let graph = graph_with(llm.clone(), saver.clone(), 8);

    assert_eq!(
        graph.history("persisted").await.unwrap(),
        first_outcome.messages
    );

    let outcome = graph.invoke("persisted", "what did I ask?").await.unwrap();
    assert_eq!(outcome.messages.len(), 6);
    assert_eq!(outcome.checkpoint_seq, 4);
    assert_eq!(llm.calls()[0].history_len, 5);

    let latest = saver.latest("persisted").await.unwrap().unwrap();
    assert_eq!(latest.seq, 4);
    assert_eq!(latest.messages, outcome.messages);
}

/// **Scenario**: Catalog lists every thread with a title from its first user message.
#[tokio::test]
async fn catalog_summaries_from_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let config = ChatBuildConfig {
        db_path: dir.path().join("chat.db").to_string_lossy().into_owned(),
        ..ChatBuildConfig::default()
    };
    let graph =
        build_chat_graph_with_llm(&config, Arc::new(MockLlm::with_no_tool_calls("ok"))).unwrap();

    graph
        .invoke("b-thread", "what is the weather in Lisbon today")
        .await
        .unwrap();
    graph.invoke("a-thread", "hello").await.unwrap();
    graph.invoke("a-thread", "again").await.unwrap();

    let summaries = graph.catalog().summaries().await;
    assert!(summaries.warning.is_none());
    let rows: Vec<(&str, &str, usize)> = summaries
        .threads
        .iter()
        .map(|s| (s.thread_id.as_str(), s.title.as_str(), s.message_count))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("a-thread", "hello", 4),
            ("b-thread", "what is the weather", 2),
        ]
    );
    assert_ne!(rows[0].1, UNTITLED_THREAD);
}
