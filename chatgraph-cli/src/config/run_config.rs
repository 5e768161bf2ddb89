//! Run config: graph build settings plus CLI presentation flags. Filled from env / .env.
//!
//! Wraps chatgraph's [`ChatBuildConfig`] so the CLI and the server read the same variables.
//! Interacts with [`RunOptions`](super::RunOptions) and [`crate::run`].

use chatgraph::ChatBuildConfig;

/// Error type used by config loading and command execution.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Settings for one CLI invocation.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Model, tools, database and limits for the chat graph.
    pub build: ChatBuildConfig,
    /// When true, render turns incrementally: Thinking... / tool markers / model chunks.
    pub stream: bool,
    /// When true, log to stderr via tracing (turn steps, checkpoints, tool calls).
    pub verbose: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            build: ChatBuildConfig::default(),
            stream: true,
            verbose: false,
        }
    }
}

impl RunConfig {
    /// Fill config from env vars. Call `dotenv::dotenv().ok()` first to pick up `.env`.
    ///
    /// See [`ChatBuildConfig::from_env`] for the variables. `OPENAI_API_KEY` is only checked when
    /// a command needs the model (`chat`); `threads` and `history` work without it.
    pub fn from_env() -> Self {
        Self {
            build: ChatBuildConfig::from_env(),
            ..Self::default()
        }
    }

    /// Apply optional overrides from `RunOptions`. Only set fields override.
    pub fn apply_options(&mut self, options: &super::RunOptions) {
        if let Some(ref db) = options.db_path {
            self.build.db_path = db.clone();
        }
        if let Some(ref model) = options.model {
            self.build.model = model.clone();
        }
        if let Some(t) = options.temperature {
            self.build.temperature = Some(t);
        }
        if let Some(tc) = options.tool_choice {
            self.build.tool_choice = Some(tc);
        }
        if let Some(rounds) = options.max_tool_rounds {
            self.build.max_tool_rounds = rounds;
        }
        if options.no_stream {
            self.stream = false;
        }
        self.verbose = options.verbose;
    }

    pub fn to_build_config(&self) -> ChatBuildConfig {
        self.build.clone()
    }

    /// One-line description for `--verbose` runs.
    pub fn summary(&self) -> String {
        format!(
            "model={} db={} max_tool_rounds={} attempts={} stream={}",
            self.build.model,
            self.build.db_path,
            self.build.max_tool_rounds,
            self.build.max_attempts,
            self.stream
        )
    }
}
