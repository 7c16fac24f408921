//! Test compaction of tables with and without tombstones.

use crate::e2e_tests::helpers::*;
use crate::storage::{OpenMode, compact, compact_and_reindex};
use crate::types::RecordRrn;

#[test]
fn test_compaction_preserves_live_content_in_order() {
    let files = TestFiles::new();
    let mut table = files.create_table();
    append_keys(&mut table, &(0..40).collect::<Vec<_>>());
    for rrn in (0..40).filter(|n| n % 4 == 1) {
        table.remove(RecordRrn(rrn)).expect("remove");
    }
    let before: Vec<_> = live_records(&mut table)
        .into_iter()
        .map(|(_, record)| record)
        .collect();

    let (mut table, mut index) =
        compact_and_reindex(table, &files.index_path).expect("compact and reindex");

    let after = live_records(&mut table);
    assert_eq!(after.len(), 30);
    for (i, (rrn, record)) in after.iter().enumerate() {
        assert_eq!(rrn.0 as usize, i);
        assert_eq!(record, &before[i]);
    }
    assert_eq!(table.header().removed_count, 0);
    assert_eq!(table.compaction_count(), 1);
    assert_index_agrees(&mut table, &mut index);
}

#[test]
fn test_compaction_counter_persists() {
    let files = TestFiles::new();
    {
        let mut table = files.create_table();
        append_keys(&mut table, &[3, 1, 2]);
        let table = compact(table).expect("compact");
        let table = compact(table).expect("compact");
        table.close().expect("close");
    }

    let table = files.open_table(OpenMode::ReadOnly);
    assert_eq!(table.compaction_count(), 2);
    assert_eq!(table.header().page_count, 2);
}

#[test]
fn test_checksum_stable_without_tombstones() {
    let files = TestFiles::new();
    let mut table = files.create_table();
    append_keys(&mut table, &[9, 8, 7, 6, 5]);
    let before = table.data_checksum().expect("checksum");

    let mut table = compact(table).expect("compact");
    assert_eq!(table.data_checksum().expect("checksum"), before);
}

#[test]
fn test_compacting_empty_table() {
    let files = TestFiles::new();
    let table = files.create_table();

    let (table, index) = compact_and_reindex(table, &files.index_path).expect("compact");
    assert_eq!(table.header().next_rrn, RecordRrn(0));
    assert!(index.is_empty());
    assert_eq!(index.height(), 0);
}
