//! Persistence backends for the banana index.
//!
//! The service only talks to [`Backend`]; which implementation sits behind
//! it is decided once at startup from `config.json`.

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{AppConfig, BackendKind};
use crate::errors::IndexResult;
use crate::state::entry::{demo_entries, EntryId, EntryPatch, IndexEntry, NewEntry};

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

/// Storage for index entries.
///
/// Every method is a single atomic step: the row(s) returned are exactly
/// the row(s) the step wrote or removed. Ids are assigned by the backend,
/// strictly increase, and are never handed out twice.
#[async_trait]
pub trait Backend: Send + Sync {
    /// All entries in id order.
    async fn list(&self) -> IndexResult<Vec<IndexEntry>>;

    /// Store a new entry and return it with its assigned id.
    async fn insert(&self, entry: NewEntry) -> IndexResult<IndexEntry>;

    async fn get(&self, id: EntryId) -> IndexResult<Option<IndexEntry>>;

    /// Merge `patch` into the entry, returning the result or `None` if the
    /// id is unknown.
    async fn update(&self, id: EntryId, patch: EntryPatch) -> IndexResult<Option<IndexEntry>>;

    /// Remove the entry, returning what was removed.
    async fn delete(&self, id: EntryId) -> IndexResult<Option<IndexEntry>>;

    /// Number of stored entries.
    async fn count(&self) -> IndexResult<usize>;

    /// Short human-readable description; doubles as a connectivity check.
    async fn describe(&self) -> IndexResult<String>;
}

pub type SharedBackend = Arc<dyn Backend>;

/// Build the backend selected in the config.
pub fn open_backend(cfg: &AppConfig) -> IndexResult<SharedBackend> {
    match cfg.backend {
        BackendKind::Memory => Ok(Arc::new(MemoryBackend::new())),
        BackendKind::Sqlite if cfg.database_path == ":memory:" => {
            Ok(Arc::new(SqliteBackend::open_memory()?))
        }
        BackendKind::Sqlite => Ok(Arc::new(SqliteBackend::open(&cfg.database_path)?)),
    }
}

/// Insert the demo rows if the backend holds nothing yet.
///
/// Returns how many rows were inserted.
pub async fn seed_if_empty(backend: &dyn Backend) -> IndexResult<usize> {
    if backend.count().await? > 0 {
        tracing::info!("Backend already populated, skipping seed data");
        return Ok(0);
    }

    let rows = demo_entries();
    let total = rows.len();
    for row in rows {
        backend.insert(row).await?;
    }

    tracing::info!("Seeded {} demo entries", total);
    Ok(total)
}
