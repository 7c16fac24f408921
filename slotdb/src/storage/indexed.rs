//! A table paired with its primary-key index.
//!
//! Keyed operations go through the index; deletes go through the table and
//! are followed by a full index rebuild, since the tree has no delete.

use std::path::{Path, PathBuf};

use crate::storage::btree::{Index, IndexError};
use crate::storage::rebuild::{self, RebuildError};
use crate::storage::table::{OpenMode, Table, TableError};
use crate::types::{FieldId, FieldValue, Record, RecordRrn};

/// A table and the index over its primary keys.
///
/// # Invariants
///
/// - Every live record's key is in the index, pointing at its slot.
/// - The index holds no other keys.
#[derive(Debug)]
pub struct IndexedTable {
    table: Table,
    index: Index,
    index_path: PathBuf,
}

impl IndexedTable {
    /// Create an empty table and index.
    pub fn create(table_path: &Path, index_path: &Path) -> Result<Self, IndexedError> {
        let table = Table::create(table_path)?;
        let index = Index::create(index_path)?;
        Ok(Self {
            table,
            index,
            index_path: index_path.to_path_buf(),
        })
    }

    /// Open an existing table and index.
    pub fn open(
        table_path: &Path,
        index_path: &Path,
        mode: OpenMode,
    ) -> Result<Self, IndexedError> {
        let table = Table::open(table_path, mode)?;
        let index = Index::open(index_path, mode)?;
        Ok(Self {
            table,
            index,
            index_path: index_path.to_path_buf(),
        })
    }

    /// Open an existing table read-write and build a fresh index for it.
    pub fn build(table_path: &Path, index_path: &Path) -> Result<Self, IndexedError> {
        let mut table = Table::open(table_path, OpenMode::ReadWrite)?;
        let index = rebuild::build_index_from_table(&mut table, index_path)?;
        Ok(Self {
            table,
            index,
            index_path: index_path.to_path_buf(),
        })
    }

    #[must_use]
    pub const fn table(&self) -> &Table {
        &self.table
    }

    #[must_use]
    pub const fn index(&self) -> &Index {
        &self.index
    }

    /// Look up a record by primary key.
    pub fn find(&mut self, key: i32) -> Result<Option<(RecordRrn, Record)>, IndexedError> {
        let Some(rrn) = self.index.search(key)? else {
            return Ok(None);
        };
        let record = self.table.read_at(rrn)?;
        if record.removed || record.primary_key != key {
            return Err(IndexedError::StaleIndex { key, rrn });
        }
        Ok(Some((rrn, record)))
    }

    /// Store a record with a key not yet in use.
    ///
    /// A duplicate key is rejected before the table is written.
    pub fn insert(&mut self, record: &Record) -> Result<RecordRrn, IndexedError> {
        let key = record.primary_key;
        if self.index.search(key)?.is_some() {
            return Err(IndexedError::Index(IndexError::DuplicateKey(key)));
        }
        let rrn = self.table.append(record)?;
        self.index.insert(key, rrn)?;
        Ok(rrn)
    }

    /// Remove every live record accepted by `predicate`, then rebuild the
    /// index. Returns the number of records removed.
    pub fn remove_where<F>(&mut self, mut predicate: F) -> Result<usize, IndexedError>
    where
        F: FnMut(&Record) -> bool,
    {
        self.table.rewind();
        let mut doomed = Vec::new();
        for row in self.table.scan() {
            let (rrn, record) = row?;
            if !record.removed && predicate(&record) {
                doomed.push(rrn);
            }
        }

        for &rrn in &doomed {
            self.table.remove(rrn)?;
        }
        if !doomed.is_empty() {
            rebuild::reindex(&mut self.table, &mut self.index)?;
        }

        tracing::debug!(removed = doomed.len(), "removed matching records");
        Ok(doomed.len())
    }

    /// Remove every live record whose `field` equals `value`.
    pub fn remove_matching(
        &mut self,
        field: FieldId,
        value: &FieldValue,
    ) -> Result<usize, IndexedError> {
        self.remove_where(|record| record.matches(field, value))
    }

    /// Every live record, in slot order.
    pub fn live_records(&mut self) -> Result<Vec<(RecordRrn, Record)>, IndexedError> {
        self.table.rewind();
        let mut out = Vec::with_capacity(self.table.live_count() as usize);
        for row in self.table.scan() {
            let (rrn, record) = row?;
            if !record.removed {
                out.push((rrn, record));
            }
        }
        Ok(out)
    }

    /// Compact the table and rebuild the index over the new slots.
    pub fn compact(self) -> Result<Self, IndexedError> {
        let Self {
            table,
            index,
            index_path,
        } = self;
        index.close()?;
        let (table, index) = rebuild::compact_and_reindex(table, &index_path)?;
        Ok(Self {
            table,
            index,
            index_path,
        })
    }

    /// Finalize and release both files.
    pub fn close(self) -> Result<(), IndexedError> {
        self.table.close()?;
        self.index.close()?;
        Ok(())
    }
}

/// Errors that can occur during indexed table operations.
#[derive(Debug)]
pub enum IndexedError {
    /// Table error.
    Table(TableError),
    /// Index error.
    Index(IndexError),
    /// Rebuild or compaction error.
    Rebuild(RebuildError),
    /// The index points at a slot that does not hold the key.
    StaleIndex { key: i32, rrn: RecordRrn },
}

impl std::fmt::Display for IndexedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table(e) => write!(f, "table error: {e}"),
            Self::Index(e) => write!(f, "index error: {e}"),
            Self::Rebuild(e) => write!(f, "rebuild error: {e}"),
            Self::StaleIndex { key, rrn } => {
                write!(f, "index maps key {key} to slot {rrn}, which does not hold it")
            }
        }
    }
}

impl std::error::Error for IndexedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Table(e) => Some(e),
            Self::Index(e) => Some(e),
            Self::Rebuild(e) => Some(e),
            Self::StaleIndex { .. } => None,
        }
    }
}

impl From<TableError> for IndexedError {
    fn from(e: TableError) -> Self {
        Self::Table(e)
    }
}

impl From<IndexError> for IndexedError {
    fn from(e: IndexError) -> Self {
        Self::Index(e)
    }
}

impl From<RebuildError> for IndexedError {
    fn from(e: RebuildError) -> Self {
        Self::Rebuild(e)
    }
}
