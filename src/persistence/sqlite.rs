//! SQLite backend.
//!
//! Uses rusqlite with bundled SQLite. Each operation is one statement,
//! writes use `RETURNING` so the row handed back is the row written.
//! Values arrive already rounded to the column scale.
//! Statements run on the blocking pool so the runtime never stalls on I/O.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::Backend;
use crate::errors::{IndexError, IndexResult};
use crate::state::entry::{EntryId, EntryPatch, IndexEntry, NewEntry};

/// `AUTOINCREMENT` keeps SQLite from reusing the id of a deleted max row.
const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS banana_index (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    country          VARCHAR(100) NOT NULL,
    price_per_kg     DECIMAL(10, 2) NOT NULL,
    average_ripeness DECIMAL(3, 1) NOT NULL,
    currency         VARCHAR(3) NOT NULL DEFAULT 'USD',
    last_updated     DATE NOT NULL DEFAULT CURRENT_DATE,
    created_at       TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);";

const ENTRY_COLUMNS: &str =
    "id, country, price_per_kg, average_ripeness, currency, last_updated, created_at";

pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
    location: String,
}

impl SqliteBackend {
    /// Open (or create) a database file and make sure the table exists.
    pub fn open(path: impl AsRef<Path>) -> IndexResult<Self> {
        let location = path.as_ref().display().to_string();
        let conn = Connection::open(path)?;
        Self::from_connection(conn, location)
    }

    /// Private in-memory database, mostly for tests.
    pub fn open_memory() -> IndexResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, ":memory:".to_string())
    }

    fn from_connection(conn: Connection, location: String) -> IndexResult<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        tracing::debug!("SQLite schema ready at {}", location);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            location,
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> IndexResult<T>
    where
        F: FnOnce(&Connection) -> IndexResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|e| IndexError::Unavailable(format!("connection mutex poisoned: {e}")))?;
            f(&guard)
        })
        .await?
    }
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<IndexEntry> {
    Ok(IndexEntry {
        id: row.get(0)?,
        country: row.get(1)?,
        price_per_kg: row.get(2)?,
        average_ripeness: row.get(3)?,
        currency: row.get(4)?,
        last_updated: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[async_trait]
impl Backend for SqliteBackend {
    async fn list(&self) -> IndexResult<Vec<IndexEntry>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {ENTRY_COLUMNS} FROM banana_index ORDER BY id"))?;
            let rows = stmt.query_map([], row_to_entry)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn insert(&self, entry: NewEntry) -> IndexResult<IndexEntry> {
        self.with_conn(move |conn| {
            let stored = conn.query_row(
                &format!(
                    "INSERT INTO banana_index
                        (country, price_per_kg, average_ripeness, currency, last_updated, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     RETURNING {ENTRY_COLUMNS}"
                ),
                params![
                    entry.country,
                    entry.price_per_kg,
                    entry.average_ripeness,
                    entry.currency,
                    entry.last_updated,
                    entry.created_at,
                ],
                row_to_entry,
            )?;
            Ok(stored)
        })
        .await
    }

    async fn get(&self, id: EntryId) -> IndexResult<Option<IndexEntry>> {
        self.with_conn(move |conn| {
            let found = conn
                .query_row(
                    &format!("SELECT {ENTRY_COLUMNS} FROM banana_index WHERE id = ?1"),
                    params![id],
                    row_to_entry,
                )
                .optional()?;
            Ok(found)
        })
        .await
    }

    async fn update(&self, id: EntryId, patch: EntryPatch) -> IndexResult<Option<IndexEntry>> {
        self.with_conn(move |conn| {
            let updated = conn
                .query_row(
                    &format!(
                        "UPDATE banana_index
                         SET country          = COALESCE(?1, country),
                             price_per_kg     = COALESCE(?2, price_per_kg),
                             average_ripeness = COALESCE(?3, average_ripeness),
                             currency         = COALESCE(?4, currency),
                             last_updated     = ?5
                         WHERE id = ?6
                         RETURNING {ENTRY_COLUMNS}"
                    ),
                    params![
                        patch.country,
                        patch.price_per_kg,
                        patch.average_ripeness,
                        patch.currency,
                        patch.last_updated,
                        id,
                    ],
                    row_to_entry,
                )
                .optional()?;
            Ok(updated)
        })
        .await
    }

    async fn delete(&self, id: EntryId) -> IndexResult<Option<IndexEntry>> {
        self.with_conn(move |conn| {
            let removed = conn
                .query_row(
                    &format!("DELETE FROM banana_index WHERE id = ?1 RETURNING {ENTRY_COLUMNS}"),
                    params![id],
                    row_to_entry,
                )
                .optional()?;
            Ok(removed)
        })
        .await
    }

    async fn count(&self) -> IndexResult<usize> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM banana_index", [], |row| row.get(0))?;
            Ok(n.max(0) as usize)
        })
        .await
    }

    async fn describe(&self) -> IndexResult<String> {
        let location = self.location.clone();
        self.with_conn(move |conn| {
            let version: String = conn.query_row("SELECT sqlite_version()", [], |row| row.get(0))?;
            Ok(format!("SQLite {version} ({location})"))
        })
        .await
    }
}
