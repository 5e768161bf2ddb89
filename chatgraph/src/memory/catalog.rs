//! Thread catalog: a derived, read-only view over a checkpointer.
//!
//! Listing never fails. A store error degrades to an empty listing with a warning so a sidebar or
//! `threads` command can still render.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::memory::checkpointer::Checkpointer;
use crate::message::Message;

/// Title shown for threads without a user message yet.
pub const UNTITLED_THREAD: &str = "Current Chat";

const TITLE_WORDS: usize = 4;

/// Distinct thread ids plus an optional degradation warning.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThreadListing {
    pub thread_ids: BTreeSet<String>,
    pub warning: Option<String>,
}

/// Display row for one thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadSummary {
    pub thread_id: String,
    pub title: String,
    pub message_count: usize,
}

/// Summaries ordered by thread id, plus warnings for anything skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThreadSummaries {
    pub threads: Vec<ThreadSummary>,
    pub warning: Option<String>,
}

/// New thread identifier (UUID v4).
pub fn generate_thread_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// First four words of the first user message, or [`UNTITLED_THREAD`].
pub fn thread_title(messages: &[Message]) -> String {
    messages
        .iter()
        .find_map(|m| match m {
            Message::User { content } => {
                let words: Vec<&str> = content.split_whitespace().take(TITLE_WORDS).collect();
                (!words.is_empty()).then(|| words.join(" "))
            }
            _ => None,
        })
        .unwrap_or_else(|| UNTITLED_THREAD.to_string())
}

/// Lists threads known to a checkpointer.
///
/// **Interaction**: Built by `CompiledChatGraph::catalog()`; used by the CLI `threads` command and
/// the server's `GET /threads`.
#[derive(Clone)]
pub struct ThreadCatalog {
    checkpointer: Arc<dyn Checkpointer>,
}

impl ThreadCatalog {
    pub fn new(checkpointer: Arc<dyn Checkpointer>) -> Self {
        Self { checkpointer }
    }

    /// All distinct thread ids. On store failure: empty set plus a warning, never an error.
    pub async fn all_threads(&self) -> ThreadListing {
        match self.checkpointer.list_thread_ids().await {
            Ok(ids) => ThreadListing {
                thread_ids: ids.into_iter().collect(),
                warning: None,
            },
            Err(e) => {
                warn!(error = %e, "could not list threads");
                ThreadListing {
                    thread_ids: BTreeSet::new(),
                    warning: Some(format!("could not list threads: {}", e)),
                }
            }
        }
    }

    /// Title and size per thread. Threads whose history fails to load are skipped and named in
    /// the warning.
    pub async fn summaries(&self) -> ThreadSummaries {
        let listing = self.all_threads().await;
        let mut warnings: Vec<String> = listing.warning.into_iter().collect();
        let mut threads = Vec::with_capacity(listing.thread_ids.len());

        for thread_id in listing.thread_ids {
            match self.checkpointer.load_latest(&thread_id).await {
                Ok(messages) => threads.push(ThreadSummary {
                    title: thread_title(&messages),
                    message_count: messages.len(),
                    thread_id,
                }),
                Err(e) => {
                    warn!(thread_id = %thread_id, error = %e, "skipping thread in summaries");
                    warnings.push(format!("skipped thread {}: {}", thread_id, e));
                }
            }
        }

        ThreadSummaries {
            threads,
            warning: (!warnings.is_empty()).then(|| warnings.join("; ")),
        }
    }
}

impl std::fmt::Debug for ThreadCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadCatalog").finish_non_exhaustive()
    }
}
