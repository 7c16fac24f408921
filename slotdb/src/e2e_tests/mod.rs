//! End-to-end tests over real table and index files.
//!
//! Each test file covers a specific scenario, using deterministic inputs
//! to verify table and index state together.

#![cfg(test)]

mod helpers;

mod test_compaction;
mod test_concrete_scenario;
mod test_dirty_file;
mod test_duplicate_key;
mod test_free_list_reuse;
mod test_index_agreement;
mod test_read_only;
