//! Disk-resident B-tree mapping primary keys to table slots.
//!
//! Nodes are allocated from a bump allocator and never freed. Insertion
//! descends recursively; a node that overflows splits and hands its median
//! back to the caller as a [`Carry`], and a carry out of the root grows the
//! tree by one level.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::storage::btree::node::{IndexEntry, IndexNode, NodeError};
use crate::storage::header::{HeaderError, IndexHeader, Status};
use crate::storage::page::{INDEX_PAGE_SIZE, IndexPage, node_offset};
use crate::storage::table::OpenMode;
use crate::types::{NodeRrn, RecordRrn};

/// A median promoted out of a split node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Carry {
    entry: IndexEntry,
    /// The split node, holding the keys below `entry`.
    lower: NodeRrn,
    /// The new node, holding the keys above `entry`.
    upper: NodeRrn,
}

/// An index file handle.
pub struct Index {
    file: File,
    header: IndexHeader,
    mode: OpenMode,
    path: PathBuf,
    closed: bool,
}

impl Index {
    /// Create an empty index file, replacing any existing one.
    pub fn create(path: &Path) -> Result<Self, IndexError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(IndexError::Io)?;

        let header = IndexHeader::new();
        file.write_all(header.to_page().as_bytes())
            .map_err(IndexError::Io)?;
        file.sync_all().map_err(IndexError::Io)?;

        tracing::info!(path = %path.display(), "created index");

        Ok(Self {
            file,
            header,
            mode: OpenMode::ReadWrite,
            path: path.to_path_buf(),
            closed: false,
        })
    }

    /// Open an existing index file.
    ///
    /// An index that was not closed cleanly is refused in every mode.
    pub fn open(path: &Path, mode: OpenMode) -> Result<Self, IndexError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(mode.is_writable())
            .open(path)
            .map_err(IndexError::Io)?;

        let mut buf = Vec::with_capacity(INDEX_PAGE_SIZE);
        Read::by_ref(&mut file)
            .take(INDEX_PAGE_SIZE as u64)
            .read_to_end(&mut buf)
            .map_err(IndexError::Io)?;

        let header = IndexHeader::from_bytes(&buf).map_err(IndexError::CorruptHeader)?;
        if header.status == Status::Dirty {
            return Err(IndexError::CorruptHeader(HeaderError::Dirty));
        }

        let mut index = Self {
            file,
            header,
            mode,
            path: path.to_path_buf(),
            closed: false,
        };

        if mode.is_writable() {
            index.header.status = Status::Dirty;
            index.write_header()?;
            index.file.sync_all().map_err(IndexError::Io)?;
        }

        tracing::debug!(
            path = %path.display(),
            ?mode,
            keys = index.header.total_keys,
            height = index.header.height,
            "opened index"
        );

        Ok(index)
    }

    /// Get a reference to the header.
    #[must_use]
    pub const fn header(&self) -> &IndexHeader {
        &self.header
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn len(&self) -> u32 {
        self.header.total_keys
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.header.root.is_none()
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.header.height
    }

    /// Read a node. `None` yields `None` without touching the file.
    pub fn node_read(&mut self, rrn: Option<NodeRrn>) -> Result<Option<IndexNode>, IndexError> {
        let Some(rrn) = rrn else {
            return Ok(None);
        };
        if rrn >= self.header.next_node_rrn {
            return Err(IndexError::NodeOutOfBounds {
                node: rrn,
                next_node_rrn: self.header.next_node_rrn,
            });
        }

        self.file
            .seek(SeekFrom::Start(node_offset(rrn)))
            .map_err(IndexError::Io)?;
        let mut buf = [0u8; INDEX_PAGE_SIZE];
        self.file.read_exact(&mut buf).map_err(IndexError::Io)?;

        let node = IndexNode::from_page(&IndexPage::from_bytes(buf))
            .map_err(|source| IndexError::CorruptNode { node: rrn, source })?;
        if node.rrn != rrn {
            return Err(IndexError::CorruptNode {
                node: rrn,
                source: NodeError::RrnMismatch(node.rrn),
            });
        }
        Ok(Some(node))
    }

    /// Write a node at its own RRN.
    pub fn node_write(&mut self, node: &IndexNode) -> Result<(), IndexError> {
        self.require_writable("node_write")?;
        self.file
            .seek(SeekFrom::Start(node_offset(node.rrn)))
            .map_err(IndexError::Io)?;
        self.file
            .write_all(node.to_page().as_bytes())
            .map_err(IndexError::Io)
    }

    /// Look up the slot holding `key`.
    pub fn search(&mut self, key: i32) -> Result<Option<RecordRrn>, IndexError> {
        let mut current = self.header.root;
        let mut height = self.header.height;
        while let Some(rrn) = current {
            let node = self.node_at_height(rrn, height)?;
            match node.search(key) {
                Ok(i) => return Ok(Some(node.entries[i].record)),
                Err(i) => current = node.children.get(i).copied().flatten(),
            }
            height -= 1;
        }
        Ok(None)
    }

    /// Read a node reached by descent and check it sits at `height`.
    /// Heights strictly decrease on the way down.
    fn node_at_height(&mut self, rrn: NodeRrn, height: u32) -> Result<IndexNode, IndexError> {
        let node = self.node_read(Some(rrn))?.ok_or(IndexError::NodeOutOfBounds {
            node: rrn,
            next_node_rrn: self.header.next_node_rrn,
        })?;
        if height == 0 || node.height != height || node.leaf != (height == 1) {
            return Err(IndexError::CorruptNode {
                node: rrn,
                source: NodeError::HeightMismatch {
                    expected: height,
                    actual: node.height,
                },
            });
        }
        Ok(node)
    }

    /// Insert a key.
    ///
    /// A key already in the tree is rejected before anything is written.
    pub fn insert(&mut self, key: i32, record: RecordRrn) -> Result<(), IndexError> {
        self.require_writable("insert")?;
        let entry = IndexEntry { key, record };

        let Some(root) = self.header.root else {
            let rrn = self.allocate_node();
            self.node_write(&IndexNode::leaf_with(rrn, entry))?;
            self.header.root = Some(rrn);
            self.header.height = 1;
            self.header.total_keys = 1;
            return Ok(());
        };

        if let Some(carry) = self.insert_into(root, self.header.height, entry)? {
            let rrn = self.allocate_node();
            let new_root = IndexNode::root_with(
                rrn,
                carry.lower,
                carry.entry,
                carry.upper,
                self.header.height,
            );
            self.node_write(&new_root)?;
            self.header.root = Some(rrn);
            self.header.height = new_root.height;
            tracing::debug!(root = %rrn, height = new_root.height, "index grew a level");
        }

        self.header.total_keys += 1;
        Ok(())
    }

    /// Insert below `rrn`, returning the median if `rrn` split.
    fn insert_into(
        &mut self,
        rrn: NodeRrn,
        height: u32,
        entry: IndexEntry,
    ) -> Result<Option<Carry>, IndexError> {
        let mut node = self.node_at_height(rrn, height)?;

        let pos = match node.search(entry.key) {
            Ok(_) => return Err(IndexError::DuplicateKey(entry.key)),
            Err(pos) => pos,
        };

        if node.leaf {
            node.insert_at(pos, entry, None);
        } else {
            let child = node
                .children
                .get(pos)
                .copied()
                .flatten()
                .ok_or(IndexError::CorruptNode {
                    node: rrn,
                    source: NodeError::MissingChild { slot: pos },
                })?;
            match self.insert_into(child, height - 1, entry)? {
                None => return Ok(None),
                Some(carry) => node.insert_at(pos, carry.entry, Some(carry.upper)),
            }
        }

        if !node.is_overfull() {
            self.node_write(&node)?;
            return Ok(None);
        }

        let upper_rrn = self.allocate_node();
        let (median, upper) = node
            .split(upper_rrn)
            .ok_or(IndexError::SplitInvariantViolation { node: rrn })?;
        self.node_write(&node)?;
        self.node_write(&upper)?;

        tracing::debug!(node = %rrn, new_node = %upper_rrn, median = median.key, "split node");

        Ok(Some(Carry {
            entry: median,
            lower: rrn,
            upper: upper_rrn,
        }))
    }

    /// All entries in key order.
    pub fn entries_in_order(&mut self) -> Result<Vec<IndexEntry>, IndexError> {
        let mut out = Vec::with_capacity(self.header.total_keys as usize);
        if let Some(root) = self.header.root {
            self.collect_in_order(root, self.header.height, &mut out)?;
        }
        Ok(out)
    }

    fn collect_in_order(
        &mut self,
        rrn: NodeRrn,
        height: u32,
        out: &mut Vec<IndexEntry>,
    ) -> Result<(), IndexError> {
        let node = self.node_at_height(rrn, height)?;
        for (i, entry) in node.entries.iter().enumerate() {
            if let Some(child) = node.children.get(i).copied().flatten() {
                self.collect_in_order(child, height - 1, out)?;
            }
            out.push(*entry);
        }
        if let Some(child) = node.children.last().copied().flatten() {
            self.collect_in_order(child, height - 1, out)?;
        }
        Ok(())
    }

    /// Drop every node, leaving an empty tree.
    pub fn clear(&mut self) -> Result<(), IndexError> {
        self.require_writable("clear")?;
        self.file
            .set_len(INDEX_PAGE_SIZE as u64)
            .map_err(IndexError::Io)?;
        self.header = IndexHeader::new();
        self.write_header()
    }

    /// Finalize the header and release the file.
    pub fn close(mut self) -> Result<(), IndexError> {
        self.finalize()
    }

    fn finalize(&mut self) -> Result<(), IndexError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if !self.mode.is_writable() {
            return Ok(());
        }

        self.header.status = Status::Clean;
        self.write_header()?;
        self.file.sync_all().map_err(IndexError::Io)
    }

    const fn allocate_node(&mut self) -> NodeRrn {
        let rrn = self.header.next_node_rrn;
        self.header.next_node_rrn = rrn.next();
        rrn
    }

    const fn require_writable(&self, operation: &'static str) -> Result<(), IndexError> {
        if self.mode.is_writable() {
            Ok(())
        } else {
            Err(IndexError::ReadOnlyViolation { operation })
        }
    }

    fn write_header(&mut self) -> Result<(), IndexError> {
        self.file.seek(SeekFrom::Start(0)).map_err(IndexError::Io)?;
        self.file
            .write_all(self.header.to_page().as_bytes())
            .map_err(IndexError::Io)
    }
}

impl Drop for Index {
    fn drop(&mut self) {
        if let Err(e) = self.finalize() {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to finalize index");
        }
    }
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

/// Errors that can occur during index operations.
#[derive(Debug)]
pub enum IndexError {
    /// I/O error.
    Io(std::io::Error),
    /// Header is unreadable or the file was not closed cleanly.
    CorruptHeader(HeaderError),
    /// A node page could not be parsed.
    CorruptNode { node: NodeRrn, source: NodeError },
    /// Node RRN past the allocator.
    NodeOutOfBounds { node: NodeRrn, next_node_rrn: NodeRrn },
    /// The key is already indexed.
    DuplicateKey(i32),
    /// A node was asked to split without holding `ORDER` entries.
    SplitInvariantViolation { node: NodeRrn },
    /// A write was attempted through a read-only handle.
    ReadOnlyViolation { operation: &'static str },
}

impl std::fmt::Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::CorruptHeader(e) => write!(f, "corrupt index header: {e}"),
            Self::CorruptNode { node, source } => write!(f, "corrupt node {node}: {source}"),
            Self::NodeOutOfBounds {
                node,
                next_node_rrn,
            } => {
                write!(f, "node {node} out of bounds (next node: {next_node_rrn})")
            }
            Self::DuplicateKey(key) => write!(f, "duplicate key: {key}"),
            Self::SplitInvariantViolation { node } => {
                write!(f, "split of node {node} which is not overfull")
            }
            Self::ReadOnlyViolation { operation } => {
                write!(f, "{operation} on a read-only index")
            }
        }
    }
}

impl std::error::Error for IndexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::CorruptHeader(e) => Some(e),
            Self::CorruptNode { source, .. } => Some(source),
            Self::NodeOutOfBounds { .. }
            | Self::DuplicateKey(_)
            | Self::SplitInvariantViolation { .. }
            | Self::ReadOnlyViolation { .. } => None,
        }
    }
}
