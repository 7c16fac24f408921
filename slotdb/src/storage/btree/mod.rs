//! Order-5 B-tree index over the table's primary keys.
//!
//! # Structure
//!
//! Every node holds up to 4 entries of `(key, record rrn)` and up to 5
//! children. Leaves sit at height 1 and all leaves are at the same depth.
//! The tree only grows: there is no delete, so a table whose records are
//! removed has its index rebuilt instead.
//!
//! # Usage
//!
//! ```no_run
//! use slotdb::storage::btree::Index;
//! use slotdb::types::RecordRrn;
//!
//! # fn main() -> Result<(), slotdb::storage::btree::IndexError> {
//! let mut index = Index::create(std::path::Path::new("routers.idx"))?;
//! index.insert(42, RecordRrn(0))?;
//! assert_eq!(index.search(42)?, Some(RecordRrn(0)));
//! index.close()?;
//! # Ok(())
//! # }
//! ```

mod node;
mod tree;

pub use node::{IndexEntry, IndexNode, MAX_KEYS, NodeError, ORDER, SPLIT_MEDIAN};
pub use tree::{Index, IndexError};
