//! Common helpers for end-to-end tests.

use std::path::PathBuf;

use tempfile::TempDir;

use crate::storage::{Index, IndexedTable, OpenMode, Table};
use crate::types::{Record, RecordRrn};

pub use crate::testing::sample_record;

/// A temporary directory holding one table and its index.
///
/// The directory and both files are removed on drop.
pub struct TestFiles {
    _dir: TempDir,
    pub table_path: PathBuf,
    pub index_path: PathBuf,
}

impl TestFiles {
    #[must_use]
    pub fn new() -> Self {
        #[allow(clippy::expect_used)]
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let table_path = dir.path().join("table.bin");
        let index_path = dir.path().join("table.idx");
        Self {
            _dir: dir,
            table_path,
            index_path,
        }
    }

    /// Create an empty table.
    pub fn create_table(&self) -> Table {
        #[allow(clippy::expect_used)]
        let table = Table::create(&self.table_path).expect("Failed to create table");
        table
    }

    /// Open the table.
    pub fn open_table(&self, mode: OpenMode) -> Table {
        #[allow(clippy::expect_used)]
        let table = Table::open(&self.table_path, mode).expect("Failed to open table");
        table
    }

    /// Create an empty table and index pair.
    pub fn create_indexed(&self) -> IndexedTable {
        #[allow(clippy::expect_used)]
        let store = IndexedTable::create(&self.table_path, &self.index_path)
            .expect("Failed to create store");
        store
    }
}

/// Append one sample record per key, returning the slots used.
pub fn append_keys(table: &mut Table, keys: &[i32]) -> Vec<RecordRrn> {
    #[allow(clippy::expect_used)]
    let rrns = keys
        .iter()
        .map(|&key| table.append(&sample_record(key)).expect("append"))
        .collect();
    rrns
}

/// Every live record in slot order.
pub fn live_records(table: &mut Table) -> Vec<(RecordRrn, Record)> {
    table.rewind();
    #[allow(clippy::expect_used)]
    let rows = table
        .scan()
        .map(|row| row.expect("scan"))
        .filter(|(_, record)| !record.removed)
        .collect();
    rows
}

/// Assert that the index holds exactly the live records of the table.
pub fn assert_index_agrees(table: &mut Table, index: &mut Index) {
    let live = live_records(table);
    #[allow(clippy::expect_used)]
    let entries = index.entries_in_order().expect("traverse index");

    assert_eq!(entries.len(), live.len(), "index size differs from live count");
    assert!(
        entries.windows(2).all(|w| w[0].key < w[1].key),
        "index traversal is not strictly increasing"
    );
    for (rrn, record) in &live {
        #[allow(clippy::expect_used)]
        let found = index.search(record.primary_key).expect("search");
        assert_eq!(found, Some(*rrn), "key {} maps to wrong slot", record.primary_key);
    }
}
