//! HTTP API over a compiled chat graph: thread listing, history and SSE-streamed turns.
//!
//! Routes:
//! - `GET /health`
//! - `POST /threads` → new thread id
//! - `GET /threads` → summaries (`warning` set when the store could not be read)
//! - `GET /threads/:id/messages` → latest history
//! - `POST /threads/:id/messages` → runs a turn; SSE when `stream` (default) else JSON outcome

pub mod logging;

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Path, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::get,
    Json, Router,
};
use chatgraph::{generate_thread_id, ChatError, CompiledChatGraph, StreamMode};
use serde::Deserialize;
use serde_json::json;
use tokio_stream::StreamExt;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info_span, warn};

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub graph: CompiledChatGraph,
}

impl AppState {
    pub fn new(graph: CompiledChatGraph) -> Arc<Self> {
        Arc::new(Self { graph })
    }
}

/// Max request body size to buffer for logging (bytes). Larger requests get 413.
const LOG_BODY_LIMIT: usize = 1024 * 1024;

/// Logs method, URI and body size at debug, then forwards the request.
async fn log_request(request: Request<Body>, next: Next) -> Result<Response, Response> {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, LOG_BODY_LIMIT)
        .await
        .map_err(|e| (StatusCode::PAYLOAD_TOO_LARGE, e.to_string()).into_response())?;
    debug!(method = %parts.method, uri = %parts.uri, body_len = bytes.len(), "request");
    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

/// Builds the router with tracing, request logging and permissive CORS.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/threads", get(list_threads).post(create_thread))
        .route(
            "/threads/:thread_id/messages",
            get(thread_messages).post(send_message),
        )
        .layer(middleware::from_fn(log_request))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                info_span!("request", method = %req.method(), uri = %req.uri())
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn create_thread() -> impl IntoResponse {
    (
        StatusCode::CREATED,
        Json(json!({ "thread_id": generate_thread_id() })),
    )
}

async fn list_threads(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.graph.catalog().summaries().await)
}

async fn thread_messages(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let messages = state.graph.history(&thread_id).await?;
    Ok(Json(json!({ "thread_id": thread_id, "messages": messages })))
}

fn default_stream() -> bool {
    true
}

/// Body of `POST /threads/:id/messages`.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    #[serde(default = "default_stream")]
    pub stream: bool,
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Response, ServerError> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(ServerError::BadRequest("content must not be empty".into()));
    }
    debug!(thread_id = %thread_id, stream = req.stream, "send message");

    if !req.stream {
        let outcome = state.graph.invoke(&thread_id, content).await?;
        return Ok(Json(outcome).into_response());
    }

    // Each event becomes `event: <kind>` / `data: <json>`; the stream ends after the terminal event.
    let events = state
        .graph
        .stream(thread_id, content, StreamMode::all())
        .map(|ev| {
            let sse = Event::default().event(ev.kind());
            Ok::<_, Infallible>(sse.json_data(&ev).unwrap_or_else(|e| {
                warn!(error = %e, "could not encode stream event");
                Event::default()
                    .event("failed")
                    .data(json!({ "message": e.to_string() }).to_string())
            }))
        });
    Ok(Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response())
}

/// Route error mapped to a status code and `{ "error": { "message" } }`.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Chat(#[from] ChatError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Chat(ChatError::EmptyThreadId) => StatusCode::BAD_REQUEST,
            ServerError::Chat(ChatError::ModelUnavailable { .. })
            | ServerError::Chat(ChatError::InvalidModelResponse(_)) => StatusCode::BAD_GATEWAY,
            ServerError::Chat(ChatError::Checkpoint(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(status = %status, error = %self, "request failed");
        }
        (status, Json(json!({ "error": { "message": self.to_string() } }))).into_response()
    }
}
