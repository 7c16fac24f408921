//! Page and slot geometry for the table and index files.
//!
//! Table file: a 960-byte header page followed by 64-byte record slots
//! (15 per page). Index file: a 65-byte header page followed by 65-byte
//! node pages. Unused bytes are always `FILLER`.

// Page geometry constants are small and fit every integer type used here.
#![allow(clippy::cast_possible_truncation)]

use crate::types::{FILLER, NodeRrn, RecordRrn};

/// Size of a table page in bytes. The first page holds the header.
pub const TABLE_PAGE_SIZE: usize = 960;

/// Size of one record slot in bytes.
pub const SLOT_SIZE: usize = 64;

/// Number of record slots per table page.
pub const SLOTS_PER_PAGE: u32 = (TABLE_PAGE_SIZE / SLOT_SIZE) as u32;

/// Size of an index page (header or node) in bytes.
pub const INDEX_PAGE_SIZE: usize = 65;

/// One encoded record slot.
pub type Slot = [u8; SLOT_SIZE];

/// Byte offset of a record slot in the table file.
#[must_use]
pub const fn slot_offset(rrn: RecordRrn) -> u64 {
    TABLE_PAGE_SIZE as u64 + rrn.index() * SLOT_SIZE as u64
}

/// Byte offset of a node page in the index file.
#[must_use]
pub const fn node_offset(rrn: NodeRrn) -> u64 {
    INDEX_PAGE_SIZE as u64 + rrn.index() * INDEX_PAGE_SIZE as u64
}

/// Number of table pages (header page included) occupied by `slots` slots.
#[must_use]
pub const fn table_pages_for(slots: u32) -> u32 {
    slots.div_ceil(SLOTS_PER_PAGE) + 1
}

/// A fixed-size page buffer.
///
/// Integers are little-endian. A fresh buffer is filled with `FILLER`.
#[derive(Clone, PartialEq, Eq)]
pub struct Page<const N: usize> {
    data: [u8; N],
}

/// A table header page.
pub type TablePage = Page<TABLE_PAGE_SIZE>;

/// An index header or node page.
pub type IndexPage = Page<INDEX_PAGE_SIZE>;

impl<const N: usize> Page<N> {
    /// Create a page filled with `FILLER`.
    #[must_use]
    pub const fn new() -> Self {
        Self { data: [FILLER; N] }
    }

    /// Create a page from raw bytes.
    #[must_use]
    pub const fn from_bytes(data: [u8; N]) -> Self {
        Self { data }
    }

    /// Get the raw page data.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; N] {
        &self.data
    }

    /// Get mutable access to the raw page data.
    pub const fn as_bytes_mut(&mut self) -> &mut [u8; N] {
        &mut self.data
    }

    /// Read a u8 at the given offset.
    #[must_use]
    pub const fn read_u8(&self, offset: usize) -> u8 {
        self.data[offset]
    }

    /// Write a u8 at the given offset.
    pub const fn write_u8(&mut self, offset: usize, value: u8) {
        self.data[offset] = value;
    }

    /// Read an i32 (little-endian) at the given offset.
    #[must_use]
    pub const fn read_i32(&self, offset: usize) -> i32 {
        i32::from_le_bytes([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ])
    }

    /// Write an i32 (little-endian) at the given offset.
    pub fn write_i32(&mut self, offset: usize, value: i32) {
        self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Read a u32 (little-endian) at the given offset.
    #[must_use]
    pub const fn read_u32(&self, offset: usize) -> u32 {
        u32::from_le_bytes([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ])
    }

    /// Write a u32 (little-endian) at the given offset.
    pub fn write_u32(&mut self, offset: usize, value: u32) {
        self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }
}

impl<const N: usize> Default for Page<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> std::fmt::Debug for Page<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("size", &N)
            .field("first_21_bytes", &&self.data[..N.min(21)])
            .finish_non_exhaustive()
    }
}
