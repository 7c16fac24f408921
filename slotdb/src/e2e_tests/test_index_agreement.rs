//! Test index/table agreement over seeded random insert and remove runs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::e2e_tests::helpers::*;
use crate::storage::{IndexedTable, OpenMode, build_index_from_table};
use crate::types::RecordRrn;

fn run_random_sequence(seed: u64, operations: usize) {
    let files = TestFiles::new();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut store = files.create_indexed();

    let mut next_key = 0;
    for _ in 0..operations {
        if rng.random_range(0..4) == 0 {
            let threshold = rng.random_range(0..=next_key.max(1));
            store
                .remove_where(|record| record.primary_key % 7 == threshold % 7)
                .expect("remove");
        } else {
            // Keys are unique but not inserted in order.
            let key = next_key * 31 % 1009;
            next_key += 1;
            store.insert(&sample_record(key)).expect("insert");
        }
    }

    for (rrn, record) in store.live_records().expect("records") {
        let (found, _) = store
            .find(record.primary_key)
            .expect("find")
            .expect("live key is indexed");
        assert_eq!(found, rrn);
    }
    let live = store.live_records().expect("records").len();
    assert_eq!(store.index().len() as usize, live);
    store.close().expect("close");

    // A rebuild from scratch agrees with the incrementally maintained index.
    let mut table = files.open_table(OpenMode::ReadWrite);
    let mut index = build_index_from_table(&mut table, &files.index_path).expect("rebuild");
    assert_index_agrees(&mut table, &mut index);
}

#[test]
fn test_random_sequences_agree() {
    for seed in [1, 7, 42, 1234] {
        run_random_sequence(seed, 300);
    }
}

#[test]
fn test_sorted_and_reverse_inserts() {
    let files = TestFiles::new();
    let mut store = files.create_indexed();

    for key in (0..100).rev() {
        store.insert(&sample_record(key)).expect("insert");
    }
    for key in 100..200 {
        store.insert(&sample_record(key)).expect("insert");
    }

    for key in [0, 99, 100, 199] {
        assert!(store.find(key).expect("find").is_some());
    }
    let (rrn, _) = store.find(0).expect("find").expect("present");
    assert_eq!(rrn, RecordRrn(99));
    assert!(store.index().height() >= 3);
}

#[test]
fn test_reopened_store_keeps_index() {
    let files = TestFiles::new();
    {
        let mut store = files.create_indexed();
        for key in 0..50 {
            store.insert(&sample_record(key * 2)).expect("insert");
        }
        store.close().expect("close");
    }

    let mut store = IndexedTable::open(
        &files.table_path,
        &files.index_path,
        OpenMode::ReadWrite,
    )
    .expect("open");
    assert_eq!(store.index().len(), 50);
    assert!(store.find(48).expect("find").is_some());
    assert!(store.find(49).expect("find").is_none());
    store.insert(&sample_record(49)).expect("insert");
    assert!(store.find(49).expect("find").is_some());
}
