//! Test the canonical remove-then-append scenario against a rebuilt index.

use crate::e2e_tests::helpers::*;
use crate::storage::{IndexedTable, OpenMode, build_index_from_table};
use crate::types::RecordRrn;

#[test]
fn test_removed_slot_is_reused_and_reindexed() {
    let files = TestFiles::new();
    let mut table = files.create_table();

    let rrns = append_keys(&mut table, &[10, 20, 5, 15]);
    assert_eq!(rrns, vec![RecordRrn(0), RecordRrn(1), RecordRrn(2), RecordRrn(3)]);

    table.remove(RecordRrn(1)).expect("remove key 20");
    let rrn = table.append(&sample_record(99)).expect("append key 99");
    assert_eq!(rrn, RecordRrn(1));

    let mut index = build_index_from_table(&mut table, &files.index_path).expect("build index");

    assert_eq!(index.search(10).expect("search"), Some(RecordRrn(0)));
    assert_eq!(index.search(20).expect("search"), None);
    assert_eq!(index.search(99).expect("search"), Some(RecordRrn(1)));
    assert_eq!(index.search(5).expect("search"), Some(RecordRrn(2)));
    assert_eq!(index.search(15).expect("search"), Some(RecordRrn(3)));

    assert_index_agrees(&mut table, &mut index);
}

#[test]
fn test_scenario_survives_reopen() {
    let files = TestFiles::new();
    {
        let mut table = files.create_table();
        append_keys(&mut table, &[10, 20, 5, 15]);
        table.remove(RecordRrn(1)).expect("remove key 20");
        table.append(&sample_record(99)).expect("append key 99");
        let index = build_index_from_table(&mut table, &files.index_path).expect("build index");
        index.close().expect("close index");
        table.close().expect("close table");
    }

    let mut store = IndexedTable::open(&files.table_path, &files.index_path, OpenMode::ReadOnly)
        .expect("open store");
    let (rrn, record) = store.find(99).expect("find").expect("key 99 present");
    assert_eq!(rrn, RecordRrn(1));
    assert_eq!(record, sample_record(99));
    assert!(store.find(20).expect("find").is_none());
    assert_eq!(store.table().header().removed_count, 0);
}
