//! Run entry points: open the graph or the catalog from config, send one message, list threads.
//!
//! Used by the `chat`, `threads` and `history` commands and by the interactive loop.

mod render;

use std::io::Write;
use std::sync::Arc;

use chatgraph::{
    Checkpointer, CompiledChatGraph, Message, SqliteSaver, StreamEvent, StreamMode, ThreadCatalog,
    TurnOutcome,
};
use tokio_stream::StreamExt;

use crate::config::{Error, RunConfig};

pub use render::{format_message, print_history, StreamPrinter};

/// Builds the chat graph with `ChatOpenAI` and SQLite checkpoints. Needs `OPENAI_API_KEY`.
pub fn open_graph(config: &RunConfig) -> Result<CompiledChatGraph, Error> {
    let graph = chatgraph::build_chat_graph(&config.to_build_config())?;
    Ok(graph)
}

/// Opens the thread catalog over the configured database; no model needed.
pub fn open_catalog(config: &RunConfig) -> Result<ThreadCatalog, Error> {
    let saver = SqliteSaver::new(&config.build.db_path)?;
    Ok(ThreadCatalog::new(Arc::new(saver)))
}

/// Latest stored messages of a thread; empty for an unknown thread. No model needed.
pub async fn load_history(config: &RunConfig, thread_id: &str) -> Result<Vec<Message>, Error> {
    let saver = SqliteSaver::new(&config.build.db_path)?;
    Ok(saver.load_latest(thread_id).await?)
}

/// Runs one turn on `thread_id` and prints it to `out`.
///
/// With `stream`, renders events as they arrive; otherwise prints the final reply once the turn
/// completes. A failed turn is returned as an error; the thread keeps its completed transitions.
pub async fn send_message<W: Write>(
    graph: &CompiledChatGraph,
    thread_id: &str,
    message: &str,
    stream: bool,
    out: &mut W,
) -> Result<TurnOutcome, Error> {
    if !stream {
        let outcome = graph.invoke(thread_id, message).await?;
        writeln!(out, "{}", outcome.reply())?;
        return Ok(outcome);
    }

    let modes = [StreamMode::Messages, StreamMode::Updates];
    let mut events = graph.stream(thread_id, message, modes);
    let mut printer = StreamPrinter::new(&mut *out);
    while let Some(event) = events.next().await {
        printer.handle(&event)?;
        match event {
            StreamEvent::Completed { outcome } => return Ok(outcome),
            StreamEvent::Failed { message } => return Err(message.into()),
            _ => {}
        }
    }
    Err("stream ended without a terminal event".into())
}

/// Prints `thread_id  title  (n messages)` per thread in id order, plus any warning.
pub async fn print_threads<W: Write>(catalog: &ThreadCatalog, out: &mut W) -> Result<(), Error> {
    let summaries = catalog.summaries().await;
    if let Some(ref warning) = summaries.warning {
        writeln!(out, "warning: {}", warning)?;
    }
    if summaries.threads.is_empty() {
        writeln!(out, "(no threads)")?;
    }
    for t in &summaries.threads {
        writeln!(
            out,
            "{}  {}  ({} messages)",
            t.thread_id, t.title, t.message_count
        )?;
    }
    Ok(())
}
