//! # chatgraph
//!
//! A checkpointed conversation state machine for tool-using chat assistants. Each thread is an
//! ordered list of messages; each user turn runs the machine
//! `AwaitingModel → (AwaitingTools → AwaitingModel)* → Done` and saves a checkpoint after every
//! transition, so a thread can be resumed or replayed by id.
//!
//! ## Design Principles
//!
//! - **Messages are the state**: a thread is `Vec<Message>`; checkpoints store the full list and
//!   every save must extend the previous one (compare-and-append).
//! - **Routing by result**: the turn executor returns a tagged [`TurnResult`]; tool calls route to
//!   the dispatcher, anything else ends the turn.
//! - **Failures stay local**: a failing tool becomes an error payload for that call only; a
//!   failing model call aborts the turn without writing a checkpoint.
//!
//! ## Main Modules
//!
//! - [`graph`]: `ChatGraph`, `CompiledChatGraph`, `TurnExecutor`, `RetryPolicy`; builds and runs turns.
//! - [`tools`]: `Tool` trait, `ToolRegistry`, `ToolDispatcher` and the shipped tools.
//! - [`llm`]: `LlmClient` trait, `MockLlm`, and `ChatOpenAI` (feature `openai`).
//! - [`memory`]: `Checkpointer`, `MemorySaver`, `SqliteSaver` (feature `sqlite`), `ThreadCatalog`.
//! - [`stream`]: `StreamEvent` / `StreamMode` for incremental rendering.
//! - [`builder`]: `ChatBuildConfig` and `build_chat_graph` for binaries.
//!
//! ## Features
//!
//! - `sqlite` (default): persistent checkpointer.
//! - `openai`: OpenAI-compatible chat completions via `async-openai`.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use chatgraph::{ChatGraph, MockLlm, ToolRegistry};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let llm = Arc::new(MockLlm::with_no_tool_calls("Hello! How can I help?"));
//! let graph = ChatGraph::new(llm, ToolRegistry::new()).compile().unwrap();
//!
//! let outcome = graph.invoke("thread-1", "hi").await.unwrap();
//! assert_eq!(outcome.reply(), "Hello! How can I help?");
//! assert_eq!(graph.history("thread-1").await.unwrap().len(), 2);
//! # }
//! ```

pub mod builder;
pub mod error;
pub mod graph;
pub mod llm;
pub mod memory;
pub mod message;
pub mod stream;
pub mod tools;

pub use builder::{default_registry, BuildError, ChatBuildConfig};
#[cfg(all(feature = "sqlite", feature = "openai"))]
pub use builder::build_chat_graph;
#[cfg(feature = "sqlite")]
pub use builder::build_chat_graph_with_llm;
pub use error::ChatError;
pub use graph::{
    ChatGraph, CompilationError, CompiledChatGraph, Phase, RetryPolicy, TurnExecutor, TurnOutcome,
    TurnResult,
};
#[cfg(feature = "openai")]
pub use llm::ChatOpenAI;
pub use llm::{LlmClient, LlmResponse, MockLlm, ModelError, ToolChoiceMode};
pub use memory::{
    generate_thread_id, Checkpoint, CheckpointError, CheckpointListItem, CheckpointMetadata,
    CheckpointSource, Checkpointer, JsonSerializer, MemorySaver, ThreadCatalog, ThreadListing,
    ThreadSummaries, ThreadSummary,
};
#[cfg(feature = "sqlite")]
pub use memory::SqliteSaver;
pub use message::{Message, Role, ToolCall, ToolErrorKind, ToolPayload, ToolResult};
pub use stream::{MessageChunk, StreamEvent, StreamMetadata, StreamMode};
pub use tools::{Tool, ToolDispatcher, ToolError, ToolRegistry, ToolSpec};
