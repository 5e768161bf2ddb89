//! Chat graph builder: registry, checkpointer and model client from one config.
//!
//! Used by the CLI and the server, which fill [`ChatBuildConfig`] from env and their own flags.

mod build;
mod config;

pub use build::{default_registry, BuildError};
#[cfg(feature = "openai")]
pub use build::build_llm;
#[cfg(all(feature = "sqlite", feature = "openai"))]
pub use build::build_chat_graph;
#[cfg(feature = "sqlite")]
pub use build::build_chat_graph_with_llm;
pub use config::{ChatBuildConfig, DEFAULT_DB_PATH, DEFAULT_MODEL};
