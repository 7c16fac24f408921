//! Field and record codec for table slots.
//!
//! # Slot Format
//!
//! ```text
//! removed  link  primary_key  country_code  linked_key  speed_unit  speed  name|  country|  $$$...
//!    1       4        4            2            4           1         4     var     var    filler
//! ```
//!
//! A tombstone stores only `removed` and `link`; the rest of the slot is
//! filler and is never decoded.

use crate::storage::page::{SLOT_SIZE, Slot};
use crate::types::{
    DELIMITER, FILLER, FieldId, FieldKind, FieldKindMismatch, FieldValue, NULL_INT, Record,
    RecordRrn, SCHEMA, ids::encode_record_rrn,
};

/// On-disk byte for a set flag.
const FLAG_SET: u8 = b'1';

/// On-disk byte for a cleared flag.
const FLAG_CLEAR: u8 = b'0';

/// Bounded writer over one slot.
///
/// Writes never go past the end of the slot.
pub struct SlotWriter {
    buf: Slot,
    pos: usize,
}

impl SlotWriter {
    /// Create a writer over a slot filled with `FILLER`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: [FILLER; SLOT_SIZE],
            pos: 0,
        }
    }

    /// Bytes still available in the slot.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        SLOT_SIZE - self.pos
    }

    /// Write as much of `bytes` as fits, returning the count written.
    fn put(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.remaining());
        self.buf[self.pos..self.pos + n].copy_from_slice(&bytes[..n]);
        self.pos += n;
        n
    }

    /// Finish the slot. Unwritten bytes stay `FILLER`.
    #[must_use]
    pub const fn finish(self) -> Slot {
        self.buf
    }
}

impl Default for SlotWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Cursor over the bytes of one slot.
///
/// The source may be shorter than a slot when the file is truncated.
pub struct SlotReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SlotReader<'a> {
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Bytes consumed so far.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize, field: FieldId) -> Result<&'a [u8], CodecError> {
        let end = self.pos + n;
        if end > self.bytes.len() {
            return Err(CodecError::UnexpectedEnd {
                field,
                offset: self.pos,
            });
        }
        let out = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn next_byte(&mut self, field: FieldId) -> Result<u8, CodecError> {
        Ok(self.take(1, field)?[0])
    }
}

/// Encode one field value.
///
/// `field` selects the schema entry; the value must be of its kind.
/// Text is truncated to leave one delimiter byte for itself and every
/// field after it, so the record never overflows the slot. Text holding
/// the delimiter byte is rejected, since it would not decode back.
///
/// Returns the number of bytes written.
pub fn encode_field(
    writer: &mut SlotWriter,
    field: FieldId,
    value: &FieldValue,
) -> Result<usize, CodecError> {
    let kind = field.descriptor().kind;
    let written = match (kind, value) {
        (FieldKind::Flag, FieldValue::Flag(b)) => {
            writer.put(&[if *b { FLAG_SET } else { FLAG_CLEAR }])
        }
        (FieldKind::Int, FieldValue::Int(n)) => writer.put(&n.to_le_bytes()),
        (FieldKind::Chars(width), FieldValue::Chars(bytes)) => {
            let mut fixed = vec![FILLER; width];
            let n = bytes.len().min(width);
            fixed[..n].copy_from_slice(&bytes[..n]);
            writer.put(&fixed)
        }
        (FieldKind::Text, FieldValue::Text(s)) => {
            if s.as_bytes().contains(&DELIMITER) {
                return Err(CodecError::DelimiterInText { field });
            }
            let budget = writer.remaining().saturating_sub(field.fields_remaining());
            let content = &s.as_bytes()[..s.len().min(budget)];
            writer.put(content) + writer.put(&[DELIMITER])
        }
        _ => {
            return Err(CodecError::FieldKindMismatch(FieldKindMismatch {
                field,
                expected: kind,
            }));
        }
    };
    Ok(written)
}

/// Decode one field value.
///
/// Text reads until the delimiter or until `budget` bytes have been
/// consumed, whichever comes first. The delimiter is consumed but not
/// returned.
pub fn decode_field(
    reader: &mut SlotReader<'_>,
    field: FieldId,
    budget: usize,
) -> Result<FieldValue, CodecError> {
    match field.descriptor().kind {
        FieldKind::Flag => match reader.next_byte(field)? {
            FLAG_SET => Ok(FieldValue::Flag(true)),
            FLAG_CLEAR => Ok(FieldValue::Flag(false)),
            other => Err(CodecError::InvalidFlag { field, byte: other }),
        },
        FieldKind::Int => {
            let bytes = reader.take(4, field)?;
            Ok(FieldValue::Int(i32::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
            ])))
        }
        FieldKind::Chars(width) => Ok(FieldValue::Chars(reader.take(width, field)?.to_vec())),
        FieldKind::Text => {
            let mut content = Vec::new();
            let mut read = 0;
            while read < budget {
                let byte = reader.next_byte(field)?;
                read += 1;
                if byte == DELIMITER {
                    break;
                }
                content.push(byte);
            }
            Ok(FieldValue::Text(String::from_utf8_lossy(&content).into_owned()))
        }
    }
}

/// Encode a record into one slot.
///
/// A tombstone writes only `removed` and `link`.
pub fn encode_record(record: &Record) -> Result<Slot, CodecError> {
    let mut writer = SlotWriter::new();
    let fields: &[FieldId] = if record.removed {
        &FieldId::ALL[..=FieldId::Link.position()]
    } else {
        &FieldId::ALL
    };

    for &field in fields {
        encode_field(&mut writer, field, &record.field(field))?;
    }

    Ok(writer.finish())
}

/// Encode the tombstone written by a delete.
#[must_use]
pub fn write_tombstone(next_free: Option<RecordRrn>) -> Slot {
    let mut writer = SlotWriter::new();
    writer.put(&[FLAG_SET]);
    writer.put(&encode_record_rrn(next_free).to_le_bytes());
    writer.finish()
}

/// Decode a record from slot bytes.
///
/// For a tombstone only `removed` and `link` are read; the payload fields
/// are left at their defaults and must not be trusted.
pub fn decode_record(bytes: &[u8]) -> Result<Record, CodecError> {
    let mut reader = SlotReader::new(bytes);
    let mut record = Record::new(NULL_INT);

    for descriptor in &SCHEMA {
        let budget = SLOT_SIZE.saturating_sub(reader.consumed());
        let value = decode_field(&mut reader, descriptor.id, budget)?;
        record
            .set_field(descriptor.id, value)
            .map_err(CodecError::FieldKindMismatch)?;

        if descriptor.id == FieldId::Link && record.removed {
            break;
        }
    }

    Ok(record)
}

/// Errors that can occur while encoding or decoding a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The source ended before a field was complete.
    UnexpectedEnd { field: FieldId, offset: usize },
    /// A flag byte was neither `'0'` nor `'1'`.
    InvalidFlag { field: FieldId, byte: u8 },
    /// A value of the wrong kind was given for a field.
    FieldKindMismatch(FieldKindMismatch),
    /// Text contains the field delimiter.
    DelimiterInText { field: FieldId },
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedEnd { field, offset } => {
                write!(f, "unexpected end of slot reading {field} at byte {offset}")
            }
            Self::InvalidFlag { field, byte } => {
                write!(f, "invalid flag byte 0x{byte:02x} in {field}")
            }
            Self::FieldKindMismatch(e) => write!(f, "{e}"),
            Self::DelimiterInText { field } => {
                write!(f, "{field} contains the delimiter byte '|'")
            }
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FieldKindMismatch(e) => Some(e),
            Self::UnexpectedEnd { .. }
            | Self::InvalidFlag { .. }
            | Self::DelimiterInText { .. } => None,
        }
    }
}
