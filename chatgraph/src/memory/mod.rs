//! # Memory: Checkpointing and Thread Catalog
//!
//! ## Overview
//!
//! 1. **Checkpointer** — per-thread message history after every transition, numbered by `seq`.
//!    Saves are compare-and-append: the new history must extend the latest one, otherwise
//!    [`CheckpointError::Conflict`].
//! 2. **ThreadCatalog** — derived view listing distinct thread ids and display summaries. Listing
//!    degrades to empty-with-warning instead of failing.
//!
//! ## Checkpointer Implementations
//!
//! | Type            | Persistence | Use case                | Feature  |
//! |-----------------|-------------|-------------------------|----------|
//! | [`MemorySaver`] | In-memory   | Dev, tests              | —        |
//! | `SqliteSaver`   | SQLite file | CLI, server             | `sqlite` |
//!
//! Use with [`ChatGraph::compile_with_checkpointer`](crate::graph::ChatGraph::compile_with_checkpointer).
//! `SqliteSaver` stores messages through a [`Serializer`] ([`JsonSerializer`] by default).

mod catalog;
mod checkpoint;
mod checkpointer;
mod memory_saver;
mod serializer;

#[cfg(feature = "sqlite")]
mod sqlite_saver;

pub use catalog::{
    generate_thread_id, thread_title, ThreadCatalog, ThreadListing, ThreadSummaries,
    ThreadSummary, UNTITLED_THREAD,
};
pub use checkpoint::{Checkpoint, CheckpointListItem, CheckpointMetadata, CheckpointSource};
pub use checkpointer::{CheckpointError, Checkpointer};
pub use memory_saver::MemorySaver;
pub use serializer::{JsonSerializer, Serializer};

#[cfg(feature = "sqlite")]
pub use sqlite_saver::SqliteSaver;
