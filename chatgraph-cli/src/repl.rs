//! Interactive chat loop: one line per message, slash commands to manage threads.

use std::io::Write;

use chatgraph::{generate_thread_id, CompiledChatGraph};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::config::Error;
use crate::run::{print_history, print_threads, send_message};

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Start a fresh thread.
    New,
    Threads,
    /// Continue an existing thread by id.
    Switch(String),
    History,
    Quit,
    Help,
    /// Plain text: send it to the model.
    Message(String),
    Empty,
    /// Slash command that is not recognized or is missing its argument.
    Invalid(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ReplCommand::Empty;
        }
        if !line.starts_with('/') {
            return ReplCommand::Message(line.to_string());
        }
        let mut parts = line.splitn(2, char::is_whitespace);
        let cmd = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());
        match (cmd, arg) {
            ("/new", None) => ReplCommand::New,
            ("/threads", None) => ReplCommand::Threads,
            ("/switch", Some(id)) => ReplCommand::Switch(id.to_string()),
            ("/switch", None) => ReplCommand::Invalid("usage: /switch <thread-id>".into()),
            ("/history", None) => ReplCommand::History,
            ("/quit", None) | ("/exit", None) => ReplCommand::Quit,
            ("/help", None) => ReplCommand::Help,
            _ => ReplCommand::Invalid(format!("unknown command: {} (try /help)", line)),
        }
    }
}

const HELP: &str = "Commands: /new, /threads, /switch <id>, /history, /quit. Anything else is sent as a message.";

/// Reads lines from `input` until EOF or `/quit`. Returns the thread that was active at the end.
///
/// A failed turn is reported and the loop continues on the same thread.
pub async fn run_repl<R, W>(
    graph: &CompiledChatGraph,
    mut thread_id: String,
    stream: bool,
    input: R,
    out: &mut W,
) -> Result<String, Error>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "Thread {}. {}", thread_id, HELP)?;
    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match ReplCommand::parse(&line) {
            ReplCommand::Empty => {}
            ReplCommand::Quit => break,
            ReplCommand::Help => writeln!(out, "{}", HELP)?,
            ReplCommand::Invalid(msg) => writeln!(out, "{}", msg)?,
            ReplCommand::New => {
                thread_id = generate_thread_id();
                writeln!(out, "Started thread {}", thread_id)?;
            }
            ReplCommand::Switch(id) => {
                let history = graph.history(&id).await?;
                writeln!(
                    out,
                    "Switched to thread {} ({} messages)",
                    id,
                    history.len()
                )?;
                thread_id = id;
            }
            ReplCommand::Threads => print_threads(&graph.catalog(), out).await?,
            ReplCommand::History => {
                let history = graph.history(&thread_id).await?;
                print_history(&history, out)?;
            }
            ReplCommand::Message(text) => {
                debug!(thread_id = %thread_id, "sending message");
                if let Err(e) = send_message(graph, &thread_id, &text, stream, out).await {
                    writeln!(out, "error: {}", e)?;
                }
            }
        }
    }
    Ok(thread_id)
}
