//! Configuration for building a chat graph (model, tools, persistence, limits).
//!
//! Used by [`build_chat_graph`](super::build_chat_graph). The CLI and the server fill it from env
//! (`from_env`) and apply their own overrides before building.

use std::time::Duration;

use crate::graph::{RetryPolicy, DEFAULT_MAX_TOOL_ROUNDS};
use crate::llm::ToolChoiceMode;

/// Default SQLite path, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "db/chatbot.db";
/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Everything needed to build a [`CompiledChatGraph`](crate::graph::CompiledChatGraph) with the
/// shipped tools and SQLite persistence.
#[derive(Clone, Debug)]
pub struct ChatBuildConfig {
    /// SQLite database path. Parent directory is created on open.
    pub db_path: String,
    /// OpenAI API key. Required to build with `ChatOpenAI`; not needed for read-only commands.
    pub api_key: Option<String>,
    /// OpenAI API base URL, e.g. `https://api.openai.com/v1`. Unset uses the client default.
    pub api_base: Option<String>,
    /// Model name, e.g. `gpt-4o-mini`.
    pub model: String,
    /// Sampling temperature 0-2. Default: unset (use API default).
    pub temperature: Option<f32>,
    /// Tool choice mode when tools are offered.
    pub tool_choice: Option<ToolChoiceMode>,
    /// System prompt sent before the history on every model call.
    pub system_prompt: Option<String>,
    /// Alpha Vantage key for `get_stock_price`. Without it the tool reports an execution error.
    pub alpha_vantage_api_key: Option<String>,
    /// Tool round-trips per turn before tools are withheld.
    pub max_tool_rounds: usize,
    /// Model call attempts per step (first call included).
    pub max_attempts: u32,
    /// Per tool call timeout.
    pub tool_timeout: Option<Duration>,
}

impl Default for ChatBuildConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            api_key: None,
            api_base: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            tool_choice: None,
            system_prompt: None,
            alpha_vantage_api_key: None,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            max_attempts: RetryPolicy::default().max_attempts,
            tool_timeout: None,
        }
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_nonempty(key).and_then(|s| s.trim().parse().ok())
}

impl ChatBuildConfig {
    /// Fill config from env vars. Call `dotenv::dotenv().ok()` first to pick up `.env`.
    ///
    /// All optional: `OPENAI_API_KEY`, `OPENAI_API_BASE`, `OPENAI_MODEL`, `OPENAI_TEMPERATURE`,
    /// `OPENAI_TOOL_CHOICE` (auto|none|required), `SYSTEM_PROMPT`, `DB_PATH`,
    /// `ALPHA_VANTAGE_API_KEY`, `MAX_TOOL_ROUNDS`, `MODEL_MAX_ATTEMPTS`, `TOOL_TIMEOUT_SECS`.
    /// Unparseable numbers fall back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            db_path: env_nonempty("DB_PATH").unwrap_or(defaults.db_path),
            api_key: env_nonempty("OPENAI_API_KEY"),
            api_base: env_nonempty("OPENAI_API_BASE"),
            model: env_nonempty("OPENAI_MODEL").unwrap_or(defaults.model),
            temperature: env_parsed("OPENAI_TEMPERATURE"),
            tool_choice: env_parsed("OPENAI_TOOL_CHOICE"),
            system_prompt: env_nonempty("SYSTEM_PROMPT"),
            alpha_vantage_api_key: env_nonempty("ALPHA_VANTAGE_API_KEY"),
            max_tool_rounds: env_parsed("MAX_TOOL_ROUNDS").unwrap_or(defaults.max_tool_rounds),
            max_attempts: env_parsed("MODEL_MAX_ATTEMPTS").unwrap_or(defaults.max_attempts),
            tool_timeout: env_parsed::<u64>("TOOL_TIMEOUT_SECS").map(Duration::from_secs),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default().with_max_attempts(self.max_attempts)
    }
}
