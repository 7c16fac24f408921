//! Test that read-only handles reject every mutation.

use crate::e2e_tests::helpers::*;
use crate::storage::{Index, IndexError, IndexedError, IndexedTable, OpenMode, TableError};
use crate::types::RecordRrn;

#[test]
fn test_read_only_table() {
    let files = TestFiles::new();
    let mut table = files.create_table();
    append_keys(&mut table, &[1, 2]);
    table.close().expect("close");

    let mut table = files.open_table(OpenMode::ReadOnly);
    assert!(matches!(
        table.append(&sample_record(3)),
        Err(TableError::ReadOnlyViolation { operation: "append" })
    ));
    assert!(matches!(
        table.remove(RecordRrn(0)),
        Err(TableError::ReadOnlyViolation { operation: "remove" })
    ));
    assert!(matches!(
        table.set_compaction_count(9),
        Err(TableError::ReadOnlyViolation { .. })
    ));

    // Reads still work.
    assert_eq!(table.read_at(RecordRrn(1)).expect("read"), sample_record(2));
    assert_eq!(live_records(&mut table).len(), 2);
}

#[test]
fn test_read_only_index() {
    let files = TestFiles::new();
    {
        let mut index = Index::create(&files.index_path).expect("create index");
        index.insert(5, RecordRrn(0)).expect("insert");
        index.close().expect("close");
    }

    let mut index = Index::open(&files.index_path, OpenMode::ReadOnly).expect("open index");
    assert_eq!(index.search(5).expect("search"), Some(RecordRrn(0)));
    assert!(matches!(
        index.insert(6, RecordRrn(1)),
        Err(IndexError::ReadOnlyViolation { operation: "insert" })
    ));
    assert!(matches!(
        index.clear(),
        Err(IndexError::ReadOnlyViolation { .. })
    ));
}

#[test]
fn test_read_only_store_rejects_removal() {
    let files = TestFiles::new();
    {
        let mut store = files.create_indexed();
        store.insert(&sample_record(1)).expect("insert");
        store.close().expect("close");
    }

    let mut store = IndexedTable::open(&files.table_path, &files.index_path, OpenMode::ReadOnly)
        .expect("open store");
    assert!(matches!(
        store.remove_where(|_| true),
        Err(IndexedError::Table(TableError::ReadOnlyViolation { .. }))
    ));
    assert!(store.find(1).expect("find").is_some());
}
