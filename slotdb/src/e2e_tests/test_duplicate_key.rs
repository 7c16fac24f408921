//! Test that duplicate keys are rejected without touching either file.

use std::fs;

use crate::e2e_tests::helpers::*;
use crate::storage::{IndexError, IndexedError};

#[test]
fn test_duplicate_leaves_files_untouched() {
    let files = TestFiles::new();
    let mut store = files.create_indexed();
    for key in [50, 10, 40, 20, 30, 60] {
        store.insert(&sample_record(key)).expect("insert");
    }

    let table_before = fs::read(&files.table_path).expect("read table");
    let index_before = fs::read(&files.index_path).expect("read index");

    let mut duplicate = sample_record(40);
    duplicate.name = "another router".to_string();
    let result = store.insert(&duplicate);
    assert!(matches!(
        result,
        Err(IndexedError::Index(IndexError::DuplicateKey(40)))
    ));

    assert_eq!(fs::read(&files.table_path).expect("read table"), table_before);
    assert_eq!(fs::read(&files.index_path).expect("read index"), index_before);

    let (_, record) = store.find(40).expect("find").expect("present");
    assert_eq!(record, sample_record(40));
}

#[test]
fn test_removed_key_can_be_inserted_again() {
    let files = TestFiles::new();
    let mut store = files.create_indexed();
    store.insert(&sample_record(1)).expect("insert");
    store.remove_where(|r| r.primary_key == 1).expect("remove");

    let mut replacement = sample_record(1);
    replacement.speed = 999;
    store.insert(&replacement).expect("reinsert");
    let (_, record) = store.find(1).expect("find").expect("present");
    assert_eq!(record.speed, 999);
}
