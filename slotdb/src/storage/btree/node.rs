//! B-tree node type and serialization.
//!
//! # Node Page Format (65 bytes)
//!
//! ```text
//! leaf  key_count  height  own_rrn  [child key record] x 4  child
//!   1       4        4        4             12 x 4            4
//! ```
//!
//! `child[i]` holds keys below `key[i]`; `child[key_count]` holds keys above
//! the last key. Unused key, record and child slots hold `-1`.

#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use crate::storage::page::IndexPage;
use crate::types::ids::{decode_node_rrn, decode_record_rrn, encode_node_rrn, encode_record_rrn};
use crate::types::{EMPTY_RRN, NodeRrn, RecordRrn};

/// Maximum number of children per node.
pub const ORDER: usize = 5;

/// Maximum number of keys per node.
pub const MAX_KEYS: usize = ORDER - 1;

/// Position of the promoted entry among the `ORDER` entries of a split.
pub const SPLIT_MEDIAN: usize = ORDER / 2;

const LEAF_FLAG: usize = 0;
const KEY_COUNT: usize = 1;
const HEIGHT: usize = 5;
const OWN_RRN: usize = 9;
const SLOTS: usize = 13;
const SLOT_WIDTH: usize = 12;
const TRAILING_CHILD: usize = SLOTS + MAX_KEYS * SLOT_WIDTH;

/// A key and the table slot holding its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub key: i32,
    pub record: RecordRrn,
}

/// One B-tree node.
///
/// # Invariants
///
/// - `entries` is sorted by key with no duplicates.
/// - `children.len() == entries.len() + 1`.
/// - Leaves have height 1 and no children; a parent is one higher than
///   each of its children.
///
/// An insert may leave a node holding `ORDER` entries in memory; it must
/// then be split before it is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNode {
    pub leaf: bool,
    pub height: u32,
    pub rrn: NodeRrn,
    pub entries: Vec<IndexEntry>,
    pub children: Vec<Option<NodeRrn>>,
}

impl IndexNode {
    /// Create a leaf holding a single entry.
    #[must_use]
    pub fn leaf_with(rrn: NodeRrn, entry: IndexEntry) -> Self {
        Self {
            leaf: true,
            height: 1,
            rrn,
            entries: vec![entry],
            children: vec![None, None],
        }
    }

    /// Create a root above two subtrees of the given height.
    #[must_use]
    pub fn root_with(
        rrn: NodeRrn,
        lower: NodeRrn,
        entry: IndexEntry,
        upper: NodeRrn,
        child_height: u32,
    ) -> Self {
        Self {
            leaf: false,
            height: child_height + 1,
            rrn,
            entries: vec![entry],
            children: vec![Some(lower), Some(upper)],
        }
    }

    /// Locate `key`: `Ok(i)` if stored at entry `i`, otherwise `Err(i)` with
    /// the insert position, which is also the child to descend into.
    pub fn search(&self, key: i32) -> Result<usize, usize> {
        self.entries.binary_search_by_key(&key, |e| e.key)
    }

    #[must_use]
    pub fn is_overfull(&self) -> bool {
        self.entries.len() > MAX_KEYS
    }

    /// Insert an entry at `pos` with `upper` as the child just above it.
    pub fn insert_at(&mut self, pos: usize, entry: IndexEntry, upper: Option<NodeRrn>) {
        self.entries.insert(pos, entry);
        self.children.insert(pos + 1, upper);
    }

    /// Split an overfull node around its median.
    ///
    /// This node keeps the entries below the median; the returned node,
    /// stored at `new_rrn`, receives the entries above it. Returns `None` if
    /// the node does not hold exactly `ORDER` entries.
    #[must_use]
    pub fn split(&mut self, new_rrn: NodeRrn) -> Option<(IndexEntry, Self)> {
        if self.entries.len() != ORDER || self.children.len() != ORDER + 1 {
            return None;
        }

        let upper_entries: Vec<IndexEntry> = self.entries.drain(SPLIT_MEDIAN + 1..).collect();
        let upper_children: Vec<Option<NodeRrn>> =
            self.children.drain(SPLIT_MEDIAN + 1..).collect();
        let median = self.entries.pop()?;

        let upper = Self {
            leaf: self.leaf,
            height: self.height,
            rrn: new_rrn,
            entries: upper_entries,
            children: upper_children,
        };
        Some((median, upper))
    }

    /// Serialize to a node page.
    #[must_use]
    pub fn to_page(&self) -> IndexPage {
        let mut page = IndexPage::new();
        page.write_u8(LEAF_FLAG, if self.leaf { b'1' } else { b'0' });
        page.write_i32(KEY_COUNT, self.entries.len() as i32);
        page.write_i32(HEIGHT, self.height as i32);
        page.write_i32(OWN_RRN, self.rrn.0 as i32);

        let child_at = |i: usize| encode_node_rrn(self.children.get(i).copied().flatten());
        for i in 0..MAX_KEYS {
            let offset = SLOTS + i * SLOT_WIDTH;
            let (key, record) = self
                .entries
                .get(i)
                .map_or((EMPTY_RRN, EMPTY_RRN), |e| {
                    (e.key, encode_record_rrn(Some(e.record)))
                });
            page.write_i32(offset, child_at(i));
            page.write_i32(offset + 4, key);
            page.write_i32(offset + 8, record);
        }
        page.write_i32(TRAILING_CHILD, child_at(MAX_KEYS));
        page
    }

    /// Deserialize from a node page.
    pub fn from_page(page: &IndexPage) -> Result<Self, NodeError> {
        let leaf = match page.read_u8(LEAF_FLAG) {
            b'1' => true,
            b'0' => false,
            other => return Err(NodeError::InvalidLeafFlag(other)),
        };

        let raw_count = page.read_i32(KEY_COUNT);
        let key_count = usize::try_from(raw_count)
            .ok()
            .filter(|&n| n <= MAX_KEYS)
            .ok_or(NodeError::InvalidKeyCount(raw_count))?;
        let height =
            u32::try_from(page.read_i32(HEIGHT)).map_err(|_| NodeError::NegativeField("height"))?;
        let rrn = decode_node_rrn(page.read_i32(OWN_RRN)).ok_or(NodeError::NegativeField("rrn"))?;

        let mut entries = Vec::with_capacity(key_count + 1);
        let mut children = Vec::with_capacity(key_count + 2);
        for i in 0..key_count {
            let offset = SLOTS + i * SLOT_WIDTH;
            children.push(decode_node_rrn(page.read_i32(offset)));
            let key = page.read_i32(offset + 4);
            let record = decode_record_rrn(page.read_i32(offset + 8))
                .ok_or(NodeError::MissingRecord { slot: i })?;
            entries.push(IndexEntry { key, record });
        }
        let last_child = if key_count == MAX_KEYS {
            TRAILING_CHILD
        } else {
            SLOTS + key_count * SLOT_WIDTH
        };
        children.push(decode_node_rrn(page.read_i32(last_child)));

        Ok(Self {
            leaf,
            height,
            rrn,
            entries,
            children,
        })
    }
}

/// Errors that can occur when parsing a node page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// Leaf flag is neither `'0'` nor `'1'`.
    InvalidLeafFlag(u8),
    /// Key count is negative or above `MAX_KEYS`.
    InvalidKeyCount(i32),
    /// A field that must be non-negative is not.
    NegativeField(&'static str),
    /// A used key slot has no record RRN.
    MissingRecord { slot: usize },
    /// An internal node has no child where one is required.
    MissingChild { slot: usize },
    /// The page was read from a different RRN than the one it records.
    RrnMismatch(NodeRrn),
    /// The node is not at the level its parent places it.
    HeightMismatch { expected: u32, actual: u32 },
}

impl std::fmt::Display for NodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLeafFlag(b) => write!(f, "invalid leaf flag: 0x{b:02x}"),
            Self::InvalidKeyCount(n) => write!(f, "invalid key count: {n} (max {MAX_KEYS})"),
            Self::NegativeField(name) => write!(f, "node field {name} is negative"),
            Self::MissingRecord { slot } => write!(f, "key slot {slot} has no record rrn"),
            Self::MissingChild { slot } => write!(f, "child slot {slot} is empty"),
            Self::RrnMismatch(stored) => write!(f, "page records rrn {stored}"),
            Self::HeightMismatch { expected, actual } => {
                write!(f, "node at height {actual} where height {expected} was expected")
            }
        }
    }
}

impl std::error::Error for NodeError {}
