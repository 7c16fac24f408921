//! Bulk index rebuild and table compaction.
//!
//! The index stores slot addresses, so anything that moves records
//! (compaction) or removes them (deletes, since the tree has no delete)
//! leaves it stale. Both paths here end with a freshly built index.

use std::path::{Path, PathBuf};

use crate::storage::btree::{Index, IndexError};
use crate::storage::table::{OpenMode, Table, TableError};

/// Build a new index at `index_path` from every live record in `table`.
///
/// Any existing file at `index_path` is replaced. The table's scan cursor
/// is left at the end.
pub fn build_index_from_table(table: &mut Table, index_path: &Path) -> Result<Index, RebuildError> {
    let mut index = Index::create(index_path)?;
    fill_index(table, &mut index)?;
    Ok(index)
}

/// Empty an open index and refill it from every live record in `table`.
pub fn reindex(table: &mut Table, index: &mut Index) -> Result<(), RebuildError> {
    index.clear()?;
    fill_index(table, index)
}

fn fill_index(table: &mut Table, index: &mut Index) -> Result<(), RebuildError> {
    table.rewind();
    let mut skipped = 0u32;
    for row in table.scan() {
        let (rrn, record) = row?;
        if record.removed {
            skipped += 1;
            continue;
        }
        index.insert(record.primary_key, rrn)?;
    }

    tracing::info!(
        table = %table.path().display(),
        index = %index.path().display(),
        keys = index.len(),
        height = index.height(),
        skipped,
        "rebuilt index"
    );
    Ok(())
}

/// Rewrite `table` without its tombstones.
///
/// Live records keep their relative order and are packed from slot 0. The
/// compaction counter is incremented and the free list is emptied. The
/// rewritten file replaces the original, which is reopened read-write.
///
/// Slot addresses change, so any index over this table is invalid
/// afterwards. Use [`compact_and_reindex`] for indexed tables.
pub fn compact(mut table: Table) -> Result<Table, RebuildError> {
    let path = table.path().to_path_buf();
    let scratch = scratch_path(&path);
    if scratch.exists() {
        tracing::warn!(path = %scratch.display(), "removing leftover compaction file");
        std::fs::remove_file(&scratch).map_err(RebuildError::Io)?;
    }

    let mut fresh = Table::create(&scratch)?;
    table.rewind();
    for row in table.scan() {
        let (_, record) = row?;
        if !record.removed {
            fresh.append(&record)?;
        }
    }
    fresh.set_compaction_count(table.compaction_count() + 1)?;

    let dropped = table.header().removed_count;
    let live = fresh.live_count();
    let count = fresh.compaction_count();

    fresh.close()?;
    table.close()?;
    std::fs::rename(&scratch, &path).map_err(RebuildError::Io)?;

    tracing::info!(
        path = %path.display(),
        live,
        dropped,
        compaction_count = count,
        "compacted table"
    );

    Ok(Table::open(&path, OpenMode::ReadWrite)?)
}

/// Compact `table` and rebuild its index at `index_path`.
pub fn compact_and_reindex(
    table: Table,
    index_path: &Path,
) -> Result<(Table, Index), RebuildError> {
    let mut table = compact(table)?;
    let index = build_index_from_table(&mut table, index_path)?;
    Ok((table, index))
}

/// Sibling path the compacted table is written to before it replaces the
/// original.
fn scratch_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".compact");
    PathBuf::from(name)
}

/// Errors that can occur while rebuilding or compacting.
#[derive(Debug)]
pub enum RebuildError {
    /// Table error.
    Table(TableError),
    /// Index error.
    Index(IndexError),
    /// I/O error replacing the table file.
    Io(std::io::Error),
}

impl std::fmt::Display for RebuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table(e) => write!(f, "table error: {e}"),
            Self::Index(e) => write!(f, "index error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for RebuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Table(e) => Some(e),
            Self::Index(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<TableError> for RebuildError {
    fn from(e: TableError) -> Self {
        Self::Table(e)
    }
}

impl From<IndexError> for RebuildError {
    fn from(e: IndexError) -> Self {
        Self::Index(e)
    }
}
