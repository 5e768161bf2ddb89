//! `chatgraph-server`: HTTP API for chat threads with SSE-streamed turns.
//!
//! Configure via env (see `ChatBuildConfig::from_env`): OPENAI_API_KEY, OPENAI_MODEL,
//! OPENAI_API_BASE, DB_PATH, etc. plus BIND_ADDR and LOG_FILE. Load .env with dotenv.

use chatgraph::{build_chat_graph, ChatBuildConfig};
use chatgraph_server::{logging::init_tracing, router, AppState};
use tracing::info;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Load .env from current directory; if not found, try parent (workspace root when run from crate dir).
fn load_dotenv() {
    if dotenv::dotenv().is_ok() {
        return;
    }
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(parent) = cwd.parent() {
            let env_path = parent.join(".env");
            if env_path.is_file() {
                let _ = dotenv::from_path(env_path);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    load_dotenv();
    if std::env::var("LOG_FILE").is_err() {
        eprintln!("chatgraph-server: LOG_FILE not set, logs only to stdout.");
    }
    init_tracing()?;

    let config = ChatBuildConfig::from_env();
    info!(
        model = %config.model,
        api_base = ?config.api_base,
        db_path = %config.db_path,
        max_tool_rounds = config.max_tool_rounds,
        max_attempts = config.max_attempts,
        "config loaded"
    );
    let graph = build_chat_graph(&config)?;
    info!(tools = ?graph.registry().names(), "chat graph ready");

    let app = router(AppState::new(graph));
    let bind = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("listening on http://{}", bind);
    axum::serve(listener, app).await?;
    Ok(())
}
