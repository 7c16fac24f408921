//! Test that files left open by a writer are refused.

use std::fs;

use crate::e2e_tests::helpers::*;
use crate::storage::{HeaderError, Index, IndexError, OpenMode, Table, TableError};
use crate::types::RecordRrn;

#[test]
fn test_unclosed_table_is_refused() {
    let files = TestFiles::new();
    let mut table = files.create_table();
    append_keys(&mut table, &[1, 2]);
    // Simulate a crash: the handle never finalizes.
    std::mem::forget(table);

    for mode in [OpenMode::ReadOnly, OpenMode::ReadWrite] {
        let result = Table::open(&files.table_path, mode);
        assert!(matches!(
            result,
            Err(TableError::CorruptHeader(HeaderError::Dirty))
        ));
    }
}

#[test]
fn test_writer_marks_file_dirty_until_close() {
    let files = TestFiles::new();
    files.create_table().close().expect("close");

    let table = files.open_table(OpenMode::ReadWrite);
    assert!(matches!(
        Table::open(&files.table_path, OpenMode::ReadOnly),
        Err(TableError::CorruptHeader(HeaderError::Dirty))
    ));
    table.close().expect("close");

    let reader = files.open_table(OpenMode::ReadOnly);
    assert_eq!(reader.header().status, crate::storage::Status::Clean);
}

#[test]
fn test_reader_leaves_file_untouched() {
    let files = TestFiles::new();
    let mut table = files.create_table();
    append_keys(&mut table, &[1, 2, 3]);
    table.close().expect("close");

    let before = fs::read(&files.table_path).expect("read file");
    let mut table = files.open_table(OpenMode::ReadOnly);
    live_records(&mut table);
    table.close().expect("close");
    assert_eq!(fs::read(&files.table_path).expect("read file"), before);
}

#[test]
fn test_garbage_status_byte() {
    let files = TestFiles::new();
    files.create_table().close().expect("close");
    let mut bytes = fs::read(&files.table_path).expect("read file");
    bytes[0] = b'?';
    fs::write(&files.table_path, &bytes).expect("write file");

    assert!(matches!(
        Table::open(&files.table_path, OpenMode::ReadOnly),
        Err(TableError::CorruptHeader(HeaderError::InvalidStatus(b'?')))
    ));
}

#[test]
fn test_unclosed_index_is_refused() {
    let files = TestFiles::new();
    let mut index = Index::create(&files.index_path).expect("create index");
    index.insert(1, RecordRrn(0)).expect("insert");
    std::mem::forget(index);

    assert!(matches!(
        Index::open(&files.index_path, OpenMode::ReadOnly),
        Err(IndexError::CorruptHeader(HeaderError::Dirty))
    ));
}
