//! SQLite-backed checkpointer (SqliteSaver).
//!
//! One row per checkpoint, keyed by `(thread_id, seq)`. Each operation runs on a blocking task,
//! holds the connection for one scoped transaction and releases it on return. Feature `sqlite`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::memory::checkpoint::{
    Checkpoint, CheckpointListItem, CheckpointMetadata, CheckpointSource,
};
use crate::memory::checkpointer::{ensure_extends, CheckpointError, Checkpointer};
use crate::memory::serializer::{JsonSerializer, Serializer};
use crate::message::Message;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS checkpoints (
    thread_id     TEXT    NOT NULL,
    seq           INTEGER NOT NULL,
    source        TEXT    NOT NULL,
    created_at    TEXT    NOT NULL,
    message_count INTEGER NOT NULL,
    messages      BLOB    NOT NULL,
    PRIMARY KEY (thread_id, seq)
);
";

type MessageSerializer = Arc<dyn Serializer<Vec<Message>>>;

/// SQLite checkpointer. Cloning shares the connection.
///
/// **Interaction**: Built by `build_chat_graph` from `ChatBuildConfig::db_path`; the CLI
/// `threads`/`history` commands open it directly.
#[derive(Clone)]
pub struct SqliteSaver {
    conn: Arc<Mutex<Connection>>,
    serializer: MessageSerializer,
}

fn storage(e: rusqlite::Error) -> CheckpointError {
    CheckpointError::Storage(e.to_string())
}

fn parse_created_at(s: &str) -> Result<DateTime<Utc>, CheckpointError> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| CheckpointError::Serialization(format!("bad created_at '{}': {}", s, e)))
}

fn parse_source(s: &str) -> Result<CheckpointSource, CheckpointError> {
    CheckpointSource::parse(s)
        .ok_or_else(|| CheckpointError::Serialization(format!("unknown checkpoint source '{}'", s)))
}

impl SqliteSaver {
    /// Opens (or creates) the database at `path`. Missing parent directories are created.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CheckpointError::Storage(format!("create {}: {}", parent.display(), e))
            })?;
        }
        let conn = Connection::open(path).map_err(storage)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))
            .map_err(storage)?;
        Self::from_connection(conn)
    }

    /// In-memory database; for tests.
    pub fn in_memory() -> Result<Self, CheckpointError> {
        Self::from_connection(Connection::open_in_memory().map_err(storage)?)
    }

    fn from_connection(conn: Connection) -> Result<Self, CheckpointError> {
        conn.execute_batch(SCHEMA).map_err(storage)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            serializer: Arc::new(JsonSerializer),
        })
    }

    /// Replaces the payload serializer (default `JsonSerializer`).
    pub fn with_serializer(mut self, serializer: impl Serializer<Vec<Message>> + 'static) -> Self {
        self.serializer = Arc::new(serializer);
        self
    }

    async fn run<T, F>(&self, f: F) -> Result<T, CheckpointError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection, &dyn Serializer<Vec<Message>>) -> Result<T, CheckpointError>
            + Send
            + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let serializer = Arc::clone(&self.serializer);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| CheckpointError::Storage("connection mutex poisoned".to_string()))?;
            f(&mut guard, serializer.as_ref())
        })
        .await
        .map_err(|e| CheckpointError::Storage(format!("blocking task failed: {}", e)))?
    }
}

impl std::fmt::Debug for SqliteSaver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSaver").finish_non_exhaustive()
    }
}

#[async_trait]
impl Checkpointer for SqliteSaver {
    async fn save(
        &self,
        thread_id: &str,
        messages: &[Message],
        source: CheckpointSource,
    ) -> Result<Checkpoint, CheckpointError> {
        let thread_id = thread_id.to_string();
        let messages = messages.to_vec();
        self.run(move |conn, serializer| {
            // IMMEDIATE takes the write lock up front so the read of the latest row and the
            // insert cannot interleave with another writer.
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(storage)?;

            let latest: Option<(i64, Vec<u8>)> = tx
                .query_row(
                    "SELECT seq, messages FROM checkpoints WHERE thread_id = ?1
                     ORDER BY seq DESC LIMIT 1",
                    params![thread_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
                .map_err(storage)?;

            let prev = match latest {
                Some((seq, bytes)) => Some((seq as u64, serializer.deserialize(&bytes)?)),
                None => None,
            };
            ensure_extends(
                &thread_id,
                prev.as_ref().map(|(seq, m)| (*seq, m.as_slice())),
                &messages,
            )?;
            let seq = prev.map(|(s, _)| s + 1).unwrap_or(1);

            let bytes = serializer.serialize(&messages)?;
            let checkpoint = Checkpoint::new(thread_id, seq, messages, source);
            tx.execute(
                "INSERT INTO checkpoints (thread_id, seq, source, created_at, message_count, messages)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    checkpoint.thread_id,
                    seq as i64,
                    source.as_str(),
                    checkpoint.metadata.created_at.to_rfc3339(),
                    checkpoint.messages.len() as i64,
                    bytes,
                ],
            )
            .map_err(storage)?;
            tx.commit().map_err(storage)?;
            Ok(checkpoint)
        })
        .await
    }

    async fn latest(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        let thread_id = thread_id.to_string();
        self.run(move |conn, serializer| {
            let row: Option<(i64, String, String, Vec<u8>)> = conn
                .query_row(
                    "SELECT seq, source, created_at, messages FROM checkpoints
                     WHERE thread_id = ?1 ORDER BY seq DESC LIMIT 1",
                    params![thread_id],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                )
                .optional()
                .map_err(storage)?;

            let Some((seq, source, created_at, bytes)) = row else {
                return Ok(None);
            };
            Ok(Some(Checkpoint {
                thread_id,
                seq: seq as u64,
                messages: serializer.deserialize(&bytes)?,
                metadata: CheckpointMetadata {
                    source: parse_source(&source)?,
                    created_at: parse_created_at(&created_at)?,
                },
            }))
        })
        .await
    }

    async fn list(&self, thread_id: &str) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let thread_id = thread_id.to_string();
        self.run(move |conn, _| {
            let mut stmt = conn
                .prepare(
                    "SELECT seq, source, created_at, message_count FROM checkpoints
                     WHERE thread_id = ?1 ORDER BY seq ASC",
                )
                .map_err(storage)?;
            let rows = stmt
                .query_map(params![thread_id], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                })
                .map_err(storage)?;

            let mut items = Vec::new();
            for row in rows {
                let (seq, source, created_at, count) = row.map_err(storage)?;
                items.push(CheckpointListItem {
                    seq: seq as u64,
                    source: parse_source(&source)?,
                    created_at: parse_created_at(&created_at)?,
                    message_count: count as usize,
                });
            }
            Ok(items)
        })
        .await
    }

    async fn list_thread_ids(&self) -> Result<Vec<String>, CheckpointError> {
        self.run(|conn, _| {
            let mut stmt = conn
                .prepare("SELECT DISTINCT thread_id FROM checkpoints")
                .map_err(storage)?;
            let ids = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(storage)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(storage)?;
            Ok(ids)
        })
        .await
    }
}
