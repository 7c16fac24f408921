//! Table and index header pages.
//!
//! Each file starts with a header page. The first byte is a status flag:
//! `'0'` while a writer has the file open, `'1'` once it has been closed
//! cleanly. A file found with status `'0'` was not closed and is unusable.

use crate::storage::page::{INDEX_PAGE_SIZE, IndexPage, TABLE_PAGE_SIZE, TablePage};
use crate::types::NodeRrn;
use crate::types::RecordRrn;
use crate::types::ids::{decode_node_rrn, decode_record_rrn, encode_node_rrn, encode_record_rrn};

/// Number of meaningful bytes at the start of the table header page.
pub const TABLE_HEADER_SIZE: usize = 21;

/// Number of meaningful bytes at the start of the index header page.
pub const INDEX_HEADER_SIZE: usize = 17;

/// Consistency status stored in the first byte of every header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// A writer has the file open, or crashed before closing it.
    Dirty,
    /// The file was closed cleanly.
    Clean,
}

impl Status {
    /// On-disk byte for this status.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::Dirty => b'0',
            Self::Clean => b'1',
        }
    }

    /// Parse the on-disk status byte.
    pub const fn from_byte(byte: u8) -> Result<Self, HeaderError> {
        match byte {
            b'0' => Ok(Self::Dirty),
            b'1' => Ok(Self::Clean),
            other => Err(HeaderError::InvalidStatus(other)),
        }
    }
}

/// Table header field offsets.
mod table_offsets {
    pub const STATUS: usize = 0;
    pub const FREE_LIST_HEAD: usize = 1;
    pub const NEXT_RRN: usize = 5;
    pub const REMOVED_COUNT: usize = 9;
    pub const PAGE_COUNT: usize = 13;
    pub const COMPACTION_COUNT: usize = 17;
    // 21-959: filler
}

/// Index header field offsets.
mod index_offsets {
    pub const STATUS: usize = 0;
    pub const ROOT: usize = 1;
    pub const TOTAL_KEYS: usize = 5;
    pub const HEIGHT: usize = 9;
    pub const NEXT_NODE_RRN: usize = 13;
    // 17-64: filler
}

/// Metadata stored in the first page of a table file.
///
/// # Invariants
///
/// - `free_list_head`, when set, names a tombstoned slot below `next_rrn`.
/// - `removed_count` equals the length of the free list.
/// - `page_count` is only refreshed on close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableHeader {
    pub status: Status,
    /// Most recently removed slot, top of the free-list stack.
    pub free_list_head: Option<RecordRrn>,
    /// First slot that has never been written.
    pub next_rrn: RecordRrn,
    /// Number of tombstoned slots.
    pub removed_count: u32,
    /// Pages occupied by the file, header page included.
    pub page_count: u32,
    /// Number of times the table has been compacted.
    pub compaction_count: u32,
}

impl TableHeader {
    /// Header for a freshly created, empty table.
    ///
    /// The status starts dirty: the creating handle is still open.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: Status::Dirty,
            free_list_head: None,
            next_rrn: RecordRrn(0),
            removed_count: 0,
            page_count: 1,
            compaction_count: 0,
        }
    }

    /// Serialize the header to a full page.
    #[must_use]
    pub fn to_page(&self) -> TablePage {
        let mut page = TablePage::new();
        page.write_u8(table_offsets::STATUS, self.status.to_byte());
        page.write_i32(
            table_offsets::FREE_LIST_HEAD,
            encode_record_rrn(self.free_list_head),
        );
        page.write_u32(table_offsets::NEXT_RRN, self.next_rrn.0);
        page.write_u32(table_offsets::REMOVED_COUNT, self.removed_count);
        page.write_u32(table_offsets::PAGE_COUNT, self.page_count);
        page.write_u32(table_offsets::COMPACTION_COUNT, self.compaction_count);
        page
    }

    /// Deserialize a header from the start of a table file.
    ///
    /// Only the first `TABLE_HEADER_SIZE` bytes are required.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HeaderError> {
        if bytes.len() < TABLE_HEADER_SIZE {
            return Err(HeaderError::Truncated {
                expected: TABLE_HEADER_SIZE,
                actual: bytes.len(),
            });
        }
        let mut raw = [0u8; TABLE_PAGE_SIZE];
        let n = bytes.len().min(TABLE_PAGE_SIZE);
        raw[..n].copy_from_slice(&bytes[..n]);
        let page = TablePage::from_bytes(raw);

        Ok(Self {
            status: Status::from_byte(page.read_u8(table_offsets::STATUS))?,
            free_list_head: decode_record_rrn(page.read_i32(table_offsets::FREE_LIST_HEAD)),
            next_rrn: RecordRrn(page.read_u32(table_offsets::NEXT_RRN)),
            removed_count: page.read_u32(table_offsets::REMOVED_COUNT),
            page_count: page.read_u32(table_offsets::PAGE_COUNT),
            compaction_count: page.read_u32(table_offsets::COMPACTION_COUNT),
        })
    }
}

impl Default for TableHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Metadata stored in the first page of an index file.
///
/// # Invariants
///
/// - `root` is `None` exactly when `total_keys == 0`.
/// - `height` is 0 for an empty tree and equals the root node's height
///   otherwise.
/// - Every node RRN below `next_node_rrn` has been written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexHeader {
    pub status: Status,
    pub root: Option<NodeRrn>,
    pub total_keys: u32,
    pub height: u32,
    /// Bump allocator for node pages.
    pub next_node_rrn: NodeRrn,
}

impl IndexHeader {
    /// Header for a freshly created, empty index.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: Status::Dirty,
            root: None,
            total_keys: 0,
            height: 0,
            next_node_rrn: NodeRrn(0),
        }
    }

    /// Serialize the header to a full page.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn to_page(&self) -> IndexPage {
        let mut page = IndexPage::new();
        page.write_u8(index_offsets::STATUS, self.status.to_byte());
        page.write_i32(index_offsets::ROOT, encode_node_rrn(self.root));
        page.write_i32(index_offsets::TOTAL_KEYS, self.total_keys as i32);
        page.write_i32(index_offsets::HEIGHT, self.height as i32);
        page.write_i32(index_offsets::NEXT_NODE_RRN, self.next_node_rrn.0 as i32);
        page
    }

    /// Deserialize a header from the start of an index file.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HeaderError> {
        if bytes.len() < INDEX_HEADER_SIZE {
            return Err(HeaderError::Truncated {
                expected: INDEX_HEADER_SIZE,
                actual: bytes.len(),
            });
        }
        let mut raw = [0u8; INDEX_PAGE_SIZE];
        let n = bytes.len().min(INDEX_PAGE_SIZE);
        raw[..n].copy_from_slice(&bytes[..n]);
        let page = IndexPage::from_bytes(raw);

        let non_negative = |offset: usize, field: &'static str| {
            u32::try_from(page.read_i32(offset)).map_err(|_| HeaderError::NegativeField(field))
        };

        Ok(Self {
            status: Status::from_byte(page.read_u8(index_offsets::STATUS))?,
            root: decode_node_rrn(page.read_i32(index_offsets::ROOT)),
            total_keys: non_negative(index_offsets::TOTAL_KEYS, "total_keys")?,
            height: non_negative(index_offsets::HEIGHT, "height")?,
            next_node_rrn: NodeRrn(non_negative(index_offsets::NEXT_NODE_RRN, "next_node_rrn")?),
        })
    }
}

impl Default for IndexHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when reading a header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// The file was left open by a writer and never closed.
    Dirty,
    /// The status byte is neither `'0'` nor `'1'`.
    InvalidStatus(u8),
    /// A count field holds a negative value.
    NegativeField(&'static str),
    /// The file is shorter than a header.
    Truncated { expected: usize, actual: usize },
}

impl std::fmt::Display for HeaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dirty => write!(f, "file was not closed cleanly"),
            Self::InvalidStatus(b) => write!(f, "invalid status byte: 0x{b:02x}"),
            Self::NegativeField(name) => write!(f, "header field {name} is negative"),
            Self::Truncated { expected, actual } => {
                write!(f, "header truncated: expected {expected} bytes, got {actual}")
            }
        }
    }
}

impl std::error::Error for HeaderError {}
