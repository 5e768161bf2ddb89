//! Optional overrides for a CLI run (command-line flags or programmatic).
//!
//! Used by [`RunConfig::apply_options`](super::RunConfig::apply_options). Callers build a
//! `RunOptions` and apply it to the env-based config.

use chatgraph::ToolChoiceMode;

/// Optional overrides: database, model settings, tool round cap, output mode.
///
/// All fields are optional; only set fields override the base config (from env).
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Override SQLite database path.
    pub db_path: Option<String>,
    /// Override model name.
    pub model: Option<String>,
    /// Override sampling temperature (0-2).
    pub temperature: Option<f32>,
    /// Override tool choice mode (auto, none, required).
    pub tool_choice: Option<ToolChoiceMode>,
    /// Override tool round-trips per turn.
    pub max_tool_rounds: Option<usize>,
    /// Print only the final reply instead of streaming.
    pub no_stream: bool,
    pub verbose: bool,
}
