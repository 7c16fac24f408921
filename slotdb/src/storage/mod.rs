//! Slot-based record store with a B-tree primary-key index.
//!
//! # File Format
//!
//! A table lives in one file:
//!
//! - Bytes 0-959: header page (status, free list head, counters)
//! - Then 64-byte record slots, 15 per 960-byte page
//!
//! Its index lives in a second file:
//!
//! - Bytes 0-64: header page (status, root, key count, height, allocator)
//! - Then 65-byte B-tree node pages
//!
//! Both headers start with a status byte that stays `'0'` while a writer
//! holds the file, so a crash leaves the file marked unusable.
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use slotdb::storage::IndexedTable;
//! use slotdb::types::Record;
//!
//! # fn main() -> Result<(), slotdb::storage::IndexedError> {
//! let mut store = IndexedTable::create(Path::new("routers.bin"), Path::new("routers.idx"))?;
//! store.insert(&Record::new(42))?;
//! assert!(store.find(42)?.is_some());
//! store.close()?;
//! # Ok(())
//! # }
//! ```

pub mod btree;
pub mod codec;
mod header;
mod indexed;
mod page;
pub mod rebuild;
mod table;

pub use btree::{Index, IndexEntry, IndexError};
pub use codec::CodecError;
pub use header::{HeaderError, IndexHeader, Status, TableHeader};
pub use indexed::{IndexedError, IndexedTable};
pub use page::{INDEX_PAGE_SIZE, SLOT_SIZE, SLOTS_PER_PAGE, TABLE_PAGE_SIZE};
pub use rebuild::{RebuildError, build_index_from_table, compact, compact_and_reindex};
pub use table::{OpenMode, Table, TableError, TableScan};
