//! Command-line arguments.

use clap::{Args, Parser, Subcommand};

use chatgraph::ToolChoiceMode;

use crate::config::RunOptions;

#[derive(Parser, Debug)]
#[command(name = "chatgraph")]
#[command(about = "Chat with a tool-using assistant; every thread is checkpointed to SQLite")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags accepted by every subcommand.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// SQLite database path (default: DB_PATH or db/chatbot.db)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<String>,

    /// Model name (default: OPENAI_MODEL or gpt-4o-mini)
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Sampling temperature 0-2
    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    /// Tool choice: auto, none or required
    #[arg(long, global = true, value_name = "MODE")]
    pub tool_choice: Option<ToolChoiceMode>,

    /// Tool round-trips per turn before tools are withheld
    #[arg(long, global = true, value_name = "N")]
    pub max_tool_rounds: Option<usize>,

    /// Log turn steps, checkpoints and tool calls to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send a message, or start an interactive session when no message is given
    Chat {
        /// Thread to continue (default: a new thread)
        #[arg(short, long, value_name = "THREAD")]
        thread: Option<String>,

        /// Print only the final reply
        #[arg(long)]
        no_stream: bool,

        #[arg(trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// List threads with their titles
    Threads,
    /// Print the stored messages of a thread
    History {
        thread: String,
    },
}

impl Cli {
    pub fn run_options(&self) -> RunOptions {
        let no_stream = matches!(self.command, Command::Chat { no_stream: true, .. });
        RunOptions {
            db_path: self.global.db.clone(),
            model: self.global.model.clone(),
            temperature: self.global.temperature,
            tool_choice: self.global.tool_choice,
            max_tool_rounds: self.global.max_tool_rounds,
            no_stream,
            verbose: self.global.verbose,
        }
    }
}

/// Joins the positional words of `chat`; `None` when empty.
pub fn message_text(words: &[String]) -> Option<String> {
    let text = words.join(" ").trim().to_string();
    (!text.is_empty()).then_some(text)
}
