//! In-memory backend.
//!
//! Entries live in a `Vec` in insertion order. Nothing survives a restart.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::Backend;
use crate::errors::{IndexError, IndexResult};
use crate::state::entry::{EntryId, EntryPatch, IndexEntry, NewEntry};

pub struct MemoryBackend {
    inner: RwLock<Inner>,
}

struct Inner {
    entries: Vec<IndexEntry>,
    /// Next id to hand out. Only ever grows, so deleted ids stay retired.
    next_id: EntryId,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: Vec::new(),
                next_id: 1,
            }),
        }
    }

    fn read(&self) -> IndexResult<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|e| IndexError::Unavailable(format!("memory store lock poisoned: {e}")))
    }

    fn write(&self) -> IndexResult<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|e| IndexError::Unavailable(format!("memory store lock poisoned: {e}")))
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn list(&self) -> IndexResult<Vec<IndexEntry>> {
        Ok(self.read()?.entries.clone())
    }

    async fn insert(&self, entry: NewEntry) -> IndexResult<IndexEntry> {
        let mut inner = self.write()?;

        let id = inner.next_id;
        inner.next_id += 1;

        let stored = IndexEntry {
            id,
            country: entry.country,
            price_per_kg: entry.price_per_kg,
            average_ripeness: entry.average_ripeness,
            currency: entry.currency,
            last_updated: entry.last_updated,
            created_at: entry.created_at,
        };
        inner.entries.push(stored.clone());

        Ok(stored)
    }

    async fn get(&self, id: EntryId) -> IndexResult<Option<IndexEntry>> {
        let inner = self.read()?;
        Ok(inner.entries.iter().find(|e| e.id == id).cloned())
    }

    async fn update(&self, id: EntryId, patch: EntryPatch) -> IndexResult<Option<IndexEntry>> {
        let mut inner = self.write()?;

        Ok(inner.entries.iter_mut().find(|e| e.id == id).map(|entry| {
            patch.apply(entry);
            entry.clone()
        }))
    }

    async fn delete(&self, id: EntryId) -> IndexResult<Option<IndexEntry>> {
        let mut inner = self.write()?;

        Ok(inner
            .entries
            .iter()
            .position(|e| e.id == id)
            .map(|index| inner.entries.remove(index)))
    }

    async fn count(&self) -> IndexResult<usize> {
        Ok(self.read()?.entries.len())
    }

    async fn describe(&self) -> IndexResult<String> {
        Ok("in-memory list".to_string())
    }
}
