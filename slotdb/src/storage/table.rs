//! Table file I/O.
//!
//! A table is a header page followed by record slots addressed by RRN.
//! Removed slots are tombstoned and threaded into a LIFO free list through
//! their `link` field; appends reuse the most recently removed slot first.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::storage::codec::{self, CodecError};
use crate::storage::header::{HeaderError, Status, TableHeader};
use crate::storage::page::{SLOT_SIZE, TABLE_PAGE_SIZE, Slot, slot_offset, table_pages_for};
use crate::types::{Record, RecordRrn};

/// How a table or index file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    ReadWrite,
}

impl OpenMode {
    #[must_use]
    pub const fn is_writable(self) -> bool {
        matches!(self, Self::ReadWrite)
    }
}

/// A table file handle.
///
/// While a writable handle is open the header on disk says dirty; the clean
/// status is written back by [`Table::close`] or on drop.
pub struct Table {
    file: File,
    header: TableHeader,
    mode: OpenMode,
    /// Next slot the scan will read.
    cursor: RecordRrn,
    path: PathBuf,
    closed: bool,
}

impl Table {
    /// Create a new, empty table file.
    ///
    /// Returns an error if the file already exists.
    pub fn create(path: &Path) -> Result<Self, TableError> {
        if path.exists() {
            return Err(TableError::AlreadyExists(path.to_path_buf()));
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(TableError::Io)?;

        let header = TableHeader::new();
        file.write_all(header.to_page().as_bytes())
            .map_err(TableError::Io)?;
        file.sync_all().map_err(TableError::Io)?;

        tracing::info!(path = %path.display(), "created table");

        Ok(Self {
            file,
            header,
            mode: OpenMode::ReadWrite,
            cursor: RecordRrn(0),
            path: path.to_path_buf(),
            closed: false,
        })
    }

    /// Open an existing table file.
    ///
    /// A file that was not closed cleanly is refused in every mode. A
    /// writable open marks the file dirty before returning.
    pub fn open(path: &Path, mode: OpenMode) -> Result<Self, TableError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(mode.is_writable())
            .open(path)
            .map_err(TableError::Io)?;

        let mut buf = Vec::with_capacity(TABLE_PAGE_SIZE);
        Read::by_ref(&mut file)
            .take(TABLE_PAGE_SIZE as u64)
            .read_to_end(&mut buf)
            .map_err(TableError::Io)?;

        let header = TableHeader::from_bytes(&buf).map_err(TableError::CorruptHeader)?;
        if header.status == Status::Dirty {
            return Err(TableError::CorruptHeader(HeaderError::Dirty));
        }

        let mut table = Self {
            file,
            header,
            mode,
            cursor: RecordRrn(0),
            path: path.to_path_buf(),
            closed: false,
        };

        if mode.is_writable() {
            table.header.status = Status::Dirty;
            table.write_header()?;
            table.file.sync_all().map_err(TableError::Io)?;
        }

        tracing::debug!(
            path = %path.display(),
            ?mode,
            next_rrn = %table.header.next_rrn,
            removed = table.header.removed_count,
            "opened table"
        );

        Ok(table)
    }

    /// Get a reference to the header.
    #[must_use]
    pub const fn header(&self) -> &TableHeader {
        &self.header
    }

    /// Path this table was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Number of slots holding a live record.
    #[must_use]
    pub const fn live_count(&self) -> u32 {
        self.header.next_rrn.0.saturating_sub(self.header.removed_count)
    }

    #[must_use]
    pub const fn compaction_count(&self) -> u32 {
        self.header.compaction_count
    }

    /// Overwrite the compaction counter.
    pub fn set_compaction_count(&mut self, count: u32) -> Result<(), TableError> {
        self.require_writable("set_compaction_count")?;
        self.header.compaction_count = count;
        self.write_header()
    }

    /// Store a record, reusing the most recently freed slot if any.
    ///
    /// The stored record is always live, whatever `record.removed` says.
    pub fn append(&mut self, record: &Record) -> Result<RecordRrn, TableError> {
        self.require_writable("append")?;

        let mut record = record.clone();
        record.removed = false;
        record.link = None;
        let slot = codec::encode_record(&record).map_err(TableError::InvalidRecord)?;

        let rrn = if let Some(head) = self.header.free_list_head {
            let freed = self.read_slot(head)?;
            if !freed.removed {
                return Err(TableError::CorruptFreeList(head));
            }
            self.write_slot(head, &slot)?;
            self.header.free_list_head = freed.link;
            self.header.removed_count = self.header.removed_count.saturating_sub(1);
            tracing::debug!(rrn = %head, key = record.primary_key, "reused free slot");
            head
        } else {
            let rrn = self.header.next_rrn;
            self.write_slot(rrn, &slot)?;
            self.header.next_rrn = rrn.next();
            tracing::debug!(rrn = %rrn, key = record.primary_key, "appended record");
            rrn
        };

        Ok(rrn)
    }

    /// Tombstone a slot and push it onto the free list.
    ///
    /// Removing a slot that is already a tombstone corrupts the free list;
    /// callers check `removed` first.
    pub fn remove(&mut self, rrn: RecordRrn) -> Result<(), TableError> {
        self.require_writable("remove")?;
        self.check_bounds(rrn)?;

        let slot = codec::write_tombstone(self.header.free_list_head);
        self.write_slot(rrn, &slot)?;
        self.header.free_list_head = Some(rrn);
        self.header.removed_count += 1;

        tracing::debug!(rrn = %rrn, "removed record");
        Ok(())
    }

    /// Read the record at `rrn`. The result may be a tombstone.
    pub fn read_at(&mut self, rrn: RecordRrn) -> Result<Record, TableError> {
        self.check_bounds(rrn)?;
        self.read_slot(rrn)
    }

    /// Iterate over slots from the cursor to the end of the table.
    ///
    /// Tombstones are yielded too. The cursor advances as the iterator is
    /// consumed; call [`Table::rewind`] to scan again.
    pub const fn scan(&mut self) -> TableScan<'_> {
        TableScan { table: self }
    }

    /// Move the scan cursor back to the first slot.
    pub const fn rewind(&mut self) {
        self.cursor = RecordRrn(0);
    }

    /// Move the scan cursor to `rrn`.
    pub fn seek(&mut self, rrn: RecordRrn) -> Result<(), TableError> {
        if rrn > self.header.next_rrn {
            return Err(TableError::RrnOutOfBounds {
                rrn,
                next_rrn: self.header.next_rrn,
            });
        }
        self.cursor = rrn;
        Ok(())
    }

    /// CRC-32 of every slot written so far.
    ///
    /// Two tables with the same live records in the same slots and no
    /// tombstones have the same checksum.
    pub fn data_checksum(&mut self) -> Result<u32, TableError> {
        self.file
            .seek(SeekFrom::Start(slot_offset(RecordRrn(0))))
            .map_err(TableError::Io)?;

        let mut hasher = crc32fast::Hasher::new();
        let mut slot = [0u8; SLOT_SIZE];
        for _ in 0..self.header.next_rrn.0 {
            self.file.read_exact(&mut slot).map_err(TableError::Io)?;
            hasher.update(&slot);
        }
        Ok(hasher.finalize())
    }

    /// Finalize the header and release the file.
    pub fn close(mut self) -> Result<(), TableError> {
        self.finalize()
    }

    fn finalize(&mut self) -> Result<(), TableError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if !self.mode.is_writable() {
            return Ok(());
        }

        self.header.page_count = table_pages_for(self.header.next_rrn.0);
        self.header.status = Status::Clean;
        self.write_header()?;
        self.file.sync_all().map_err(TableError::Io)?;

        tracing::debug!(
            path = %self.path.display(),
            pages = self.header.page_count,
            "closed table"
        );
        Ok(())
    }

    const fn require_writable(&self, operation: &'static str) -> Result<(), TableError> {
        if self.mode.is_writable() {
            Ok(())
        } else {
            Err(TableError::ReadOnlyViolation { operation })
        }
    }

    const fn check_bounds(&self, rrn: RecordRrn) -> Result<(), TableError> {
        if rrn.0 >= self.header.next_rrn.0 {
            return Err(TableError::RrnOutOfBounds {
                rrn,
                next_rrn: self.header.next_rrn,
            });
        }
        Ok(())
    }

    fn write_header(&mut self) -> Result<(), TableError> {
        self.file.seek(SeekFrom::Start(0)).map_err(TableError::Io)?;
        self.file
            .write_all(self.header.to_page().as_bytes())
            .map_err(TableError::Io)
    }

    fn write_slot(&mut self, rrn: RecordRrn, slot: &Slot) -> Result<(), TableError> {
        self.file
            .seek(SeekFrom::Start(slot_offset(rrn)))
            .map_err(TableError::Io)?;
        self.file.write_all(slot).map_err(TableError::Io)
    }

    /// Read and decode one slot. A short file surfaces as a codec error.
    fn read_slot(&mut self, rrn: RecordRrn) -> Result<Record, TableError> {
        self.file
            .seek(SeekFrom::Start(slot_offset(rrn)))
            .map_err(TableError::Io)?;

        let mut buf = Vec::with_capacity(SLOT_SIZE);
        Read::by_ref(&mut self.file)
            .take(SLOT_SIZE as u64)
            .read_to_end(&mut buf)
            .map_err(TableError::Io)?;

        codec::decode_record(&buf).map_err(|source| TableError::Codec { rrn, source })
    }
}

impl Drop for Table {
    fn drop(&mut self) {
        if let Err(e) = self.finalize() {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to finalize table");
        }
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("header", &self.header)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

/// Sequential iterator over a table's slots.
pub struct TableScan<'a> {
    table: &'a mut Table,
}

impl Iterator for TableScan<'_> {
    type Item = Result<(RecordRrn, Record), TableError>;

    fn next(&mut self) -> Option<Self::Item> {
        let rrn = self.table.cursor;
        if rrn >= self.table.header.next_rrn {
            return None;
        }
        self.table.cursor = rrn.next();
        Some(self.table.read_slot(rrn).map(|record| (rrn, record)))
    }
}

/// Errors that can occur during table operations.
#[derive(Debug)]
pub enum TableError {
    /// I/O error.
    Io(std::io::Error),
    /// File already exists.
    AlreadyExists(PathBuf),
    /// Header is unreadable or the file was not closed cleanly.
    CorruptHeader(HeaderError),
    /// A slot could not be decoded.
    Codec { rrn: RecordRrn, source: CodecError },
    /// A record could not be encoded into a slot.
    InvalidRecord(CodecError),
    /// A write was attempted through a read-only handle.
    ReadOnlyViolation { operation: &'static str },
    /// RRN past the last written slot.
    RrnOutOfBounds { rrn: RecordRrn, next_rrn: RecordRrn },
    /// The free-list head is not a tombstone.
    CorruptFreeList(RecordRrn),
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::AlreadyExists(p) => write!(f, "file already exists: {}", p.display()),
            Self::CorruptHeader(e) => write!(f, "corrupt table header: {e}"),
            Self::Codec { rrn, source } => write!(f, "slot {rrn}: {source}"),
            Self::InvalidRecord(e) => write!(f, "invalid record: {e}"),
            Self::ReadOnlyViolation { operation } => {
                write!(f, "{operation} on a read-only table")
            }
            Self::RrnOutOfBounds { rrn, next_rrn } => {
                write!(f, "slot {rrn} out of bounds (next rrn: {next_rrn})")
            }
            Self::CorruptFreeList(rrn) => {
                write!(f, "free list head {rrn} is not a removed slot")
            }
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::CorruptHeader(e) => Some(e),
            Self::Codec { source, .. } | Self::InvalidRecord(source) => Some(source),
            Self::AlreadyExists(_)
            | Self::ReadOnlyViolation { .. }
            | Self::RrnOutOfBounds { .. }
            | Self::CorruptFreeList(_) => None,
        }
    }
}
