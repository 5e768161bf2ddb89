//! Builds the tool registry, checkpointer and model client from [`ChatBuildConfig`].
//!
//! Used by the CLI and the server. `build_chat_graph` needs the `sqlite` and `openai` features;
//! `build_chat_graph_with_llm` only `sqlite` so callers can plug in another `LlmClient`.

use std::sync::Arc;

use thiserror::Error;

use crate::graph::CompilationError;
use crate::memory::CheckpointError;
use crate::tools::{
    CalculatorTool, RegistryError, StockPriceTool, Tool, ToolRegistry, WebSearchTool,
};

use super::config::ChatBuildConfig;

#[cfg(feature = "sqlite")]
use crate::graph::{ChatGraph, CompiledChatGraph};
#[cfg(feature = "sqlite")]
use crate::llm::LlmClient;
#[cfg(feature = "sqlite")]
use crate::memory::SqliteSaver;

/// Error while assembling a chat graph from config. Fatal at startup.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("OPENAI_API_KEY is not set; please configure it in .env")]
    MissingApiKey,
    #[error("failed to open checkpoint store: {0}")]
    Checkpoint(#[from] CheckpointError),
    #[error("failed to register tools: {0}")]
    Registry(#[from] RegistryError),
    #[error("invalid chat graph configuration: {0}")]
    Compilation(#[from] CompilationError),
}

/// Registers the shipped tools: `calculator`, `get_stock_price`, `web_search`.
pub fn default_registry(config: &ChatBuildConfig) -> Result<ToolRegistry, RegistryError> {
    let tools: Vec<Arc<dyn Tool>> = vec![
        Arc::new(WebSearchTool::new()),
        Arc::new(CalculatorTool::new()),
        Arc::new(StockPriceTool::new(config.alpha_vantage_api_key.clone())),
    ];
    ToolRegistry::with_tools(tools)
}

/// Builds a `ChatOpenAI` from key, base URL, model, temperature, tool choice and system prompt.
#[cfg(feature = "openai")]
pub fn build_llm(config: &ChatBuildConfig) -> Result<crate::llm::ChatOpenAI, BuildError> {
    use async_openai::config::OpenAIConfig;

    let api_key = config.api_key.as_deref().ok_or(BuildError::MissingApiKey)?;
    let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(ref base) = config.api_base {
        openai_config = openai_config.with_api_base(base);
    }
    let mut llm = crate::llm::ChatOpenAI::with_config(openai_config, config.model.clone());
    if let Some(t) = config.temperature {
        llm = llm.with_temperature(t);
    }
    if let Some(mode) = config.tool_choice {
        llm = llm.with_tool_choice(mode);
    }
    if let Some(ref prompt) = config.system_prompt {
        llm = llm.with_system_prompt(prompt.clone());
    }
    Ok(llm)
}

/// Builds the graph with SQLite persistence at `config.db_path` and the given model client.
#[cfg(feature = "sqlite")]
pub fn build_chat_graph_with_llm(
    config: &ChatBuildConfig,
    llm: Arc<dyn LlmClient>,
) -> Result<CompiledChatGraph, BuildError> {
    let checkpointer = SqliteSaver::new(&config.db_path)?;
    let registry = default_registry(config)?;
    let mut graph = ChatGraph::new(llm, registry)
        .with_max_tool_rounds(config.max_tool_rounds)
        .with_retry_policy(config.retry_policy());
    if let Some(timeout) = config.tool_timeout {
        graph = graph.with_tool_timeout(timeout);
    }
    Ok(graph.compile_with_checkpointer(Arc::new(checkpointer))?)
}

/// Builds the graph with `ChatOpenAI` and SQLite persistence.
#[cfg(all(feature = "sqlite", feature = "openai"))]
pub fn build_chat_graph(config: &ChatBuildConfig) -> Result<CompiledChatGraph, BuildError> {
    let llm = build_llm(config)?;
    build_chat_graph_with_llm(config, Arc::new(llm))
}
