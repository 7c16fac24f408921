//! Test that removed slots are reused most-recent first.

use crate::e2e_tests::helpers::*;
use crate::storage::OpenMode;
use crate::types::RecordRrn;

#[test]
fn test_lifo_reuse_across_reopen() {
    let files = TestFiles::new();
    {
        let mut table = files.create_table();
        append_keys(&mut table, &[1, 2, 3, 4, 5, 6]);
        for rrn in [4, 0, 2] {
            table.remove(RecordRrn(rrn)).expect("remove");
        }
        table.close().expect("close");
    }

    let mut table = files.open_table(OpenMode::ReadWrite);
    assert_eq!(table.header().removed_count, 3);
    assert_eq!(table.header().free_list_head, Some(RecordRrn(2)));

    let reused = append_keys(&mut table, &[7, 8, 9, 10]);
    assert_eq!(
        reused,
        vec![RecordRrn(2), RecordRrn(0), RecordRrn(4), RecordRrn(6)]
    );
    assert_eq!(table.header().removed_count, 0);
    assert_eq!(table.header().free_list_head, None);
    assert_eq!(table.live_count(), 7);
}

#[test]
fn test_free_list_threads_through_tombstones() {
    let files = TestFiles::new();
    let mut table = files.create_table();
    append_keys(&mut table, &[1, 2, 3]);

    table.remove(RecordRrn(0)).expect("remove");
    table.remove(RecordRrn(2)).expect("remove");

    let head = table.read_at(RecordRrn(2)).expect("read");
    assert!(head.removed);
    assert_eq!(head.link, Some(RecordRrn(0)));

    let tail = table.read_at(RecordRrn(0)).expect("read");
    assert!(tail.removed);
    assert_eq!(tail.link, None);

    let live = live_records(&mut table);
    assert_eq!(live, vec![(RecordRrn(1), sample_record(2))]);
}
