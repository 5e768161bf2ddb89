//! chatgraph-cli library: config, command execution and terminal rendering for the `chatgraph`
//! binary.
//!
//! Reads model and database settings from `.env`, builds the chat graph and runs one-shot or
//! interactive chats against checkpointed threads.
//!
//! ## Usage
//!
//! ```rust,no_run
//! # async fn demo() -> Result<(), chatgraph_cli::Error> {
//! dotenv::dotenv().ok();
//! let config = chatgraph_cli::RunConfig::from_env();
//! let graph = chatgraph_cli::open_graph(&config)?;
//! let mut out = std::io::stdout();
//! chatgraph_cli::send_message(&graph, "thread-1", "add 3 and 4", true, &mut out).await?;
//! # Ok(())
//! # }
//! ```

mod cli;
mod config;
mod logging;
mod repl;
mod run;

pub use cli::{message_text, Cli, Command, GlobalArgs};
pub use config::{Error, RunConfig, RunOptions};
pub use logging::init_tracing;
pub use repl::{run_repl, ReplCommand};
pub use run::{
    format_message, load_history, open_catalog, open_graph, print_history, print_threads,
    send_message, StreamPrinter,
};

#[cfg(test)]
mod tests;
