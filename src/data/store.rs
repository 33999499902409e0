use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::table::Table;
use crate::error::{DaplotError, Result};

/// Opaque identifier of a stored table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(String);

impl TableId {
    /// A fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TableId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TableId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Shape of one stored table, as reported by [`TableStore::list`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub id: TableId,
    pub rows: usize,
    pub columns: usize,
    pub headers: Vec<String>,
}

struct Entry {
    table: Arc<Table>,
    /// Insertion sequence, so listings follow creation order.
    seq: u64,
}

#[derive(Default)]
struct Inner {
    tables: HashMap<TableId, Entry>,
    next_seq: u64,
}

/// In-memory table storage keyed by [`TableId`].
///
/// Each operation takes the lock once, so readers never see a half-written
/// table; there is no transaction spanning several operations. Tables are
/// handed out as `Arc<Table>` snapshots.
#[derive(Default)]
pub struct TableStore {
    inner: RwLock<Inner>,
}

impl TableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new table under a freshly generated id.
    pub fn create(&self, table: Table) -> TableId {
        let id = TableId::generate();
        self.replace(id.clone(), table);
        id
    }

    /// Insert or wholesale replace the table stored under `id`.
    /// Returns `true` when an existing table was replaced.
    pub fn replace(&self, id: TableId, table: Table) -> bool {
        let (rows, cols) = (table.row_count(), table.column_count());
        let mut inner = self.inner.write();
        let existing_seq = inner.tables.get(&id).map(|e| e.seq);
        let seq = match existing_seq {
            Some(seq) => seq,
            None => {
                inner.next_seq += 1;
                inner.next_seq
            }
        };
        let replaced = inner
            .tables
            .insert(
                id.clone(),
                Entry {
                    table: Arc::new(table),
                    seq,
                },
            )
            .is_some();
        let stored = inner.tables.len();
        drop(inner);

        if replaced {
            log::info!("Replaced table {id} ({rows} rows × {cols} columns)");
        } else {
            log::info!("Stored table {id} ({rows} rows × {cols} columns), {stored} tables in memory");
        }
        replaced
    }

    pub fn get(&self, id: &TableId) -> Result<Arc<Table>> {
        self.inner
            .read()
            .tables
            .get(id)
            .map(|e| Arc::clone(&e.table))
            .ok_or_else(|| DaplotError::NotFound(id.to_string()))
    }

    pub fn contains(&self, id: &TableId) -> bool {
        self.inner.read().tables.contains_key(id)
    }

    /// Summaries of all stored tables, oldest first.
    pub fn list(&self) -> Vec<TableSummary> {
        let inner = self.inner.read();
        let mut entries: Vec<(&TableId, &Entry)> = inner.tables.iter().collect();
        entries.sort_by_key(|(_, e)| e.seq);
        entries
            .into_iter()
            .map(|(id, e)| TableSummary {
                id: id.clone(),
                rows: e.table.row_count(),
                columns: e.table.column_count(),
                headers: e.table.column_names(),
            })
            .collect()
    }

    pub fn delete(&self, id: &TableId) -> Result<()> {
        match self.inner.write().tables.remove(id) {
            Some(_) => {
                log::info!("Deleted table {id}");
                Ok(())
            }
            None => Err(DaplotError::NotFound(id.to_string())),
        }
    }

    /// Remove every table, returning how many were removed.
    pub fn clear(&self) -> usize {
        let removed = {
            let mut inner = self.inner.write();
            let n = inner.tables.len();
            inner.tables.clear();
            n
        };
        log::info!("Cleared {removed} tables");
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.read().tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
