//! The fixed nine-field record stored in a table slot.

use crate::types::field::{FieldId, FieldKind, FieldValue, FILLER, NULL_INT};
use crate::types::ids::{RecordRrn, decode_record_rrn, encode_record_rrn};

/// One table record.
///
/// # Invariants
///
/// - `link` is only meaningful when `removed` is set; it is the next entry
///   of the table's free list.
/// - When `removed` is set, every payload field is meaningless. Decoding a
///   tombstone leaves them at their defaults.
/// - Null payload values follow the file format: `NULL_INT` for integers,
///   `FILLER` bytes for character arrays and an empty string for text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub removed: bool,
    pub link: Option<RecordRrn>,
    pub primary_key: i32,
    pub country_code: [u8; 2],
    pub linked_key: i32,
    pub speed_unit: u8,
    pub speed: i32,
    pub name: String,
    pub country: String,
}

impl Record {
    /// A live record with the given key and every payload field null.
    #[must_use]
    pub const fn new(primary_key: i32) -> Self {
        Self {
            removed: false,
            link: None,
            primary_key,
            country_code: [FILLER; 2],
            linked_key: NULL_INT,
            speed_unit: FILLER,
            speed: NULL_INT,
            name: String::new(),
            country: String::new(),
        }
    }

    /// A tombstone pointing at the next free slot.
    #[must_use]
    pub const fn tombstone(link: Option<RecordRrn>) -> Self {
        let mut record = Self::new(NULL_INT);
        record.removed = true;
        record.link = link;
        record
    }

    /// Read a field as a generic value.
    #[must_use]
    pub fn field(&self, id: FieldId) -> FieldValue {
        match id {
            FieldId::Removed => FieldValue::Flag(self.removed),
            FieldId::Link => FieldValue::Int(encode_record_rrn(self.link)),
            FieldId::PrimaryKey => FieldValue::Int(self.primary_key),
            FieldId::CountryCode => FieldValue::Chars(self.country_code.to_vec()),
            FieldId::LinkedKey => FieldValue::Int(self.linked_key),
            FieldId::SpeedUnit => FieldValue::Chars(vec![self.speed_unit]),
            FieldId::Speed => FieldValue::Int(self.speed),
            FieldId::Name => FieldValue::Text(self.name.clone()),
            FieldId::Country => FieldValue::Text(self.country.clone()),
        }
    }

    /// Overwrite a field from a generic value.
    ///
    /// Character arrays shorter than the field are padded with `FILLER`;
    /// longer ones are truncated.
    pub fn set_field(&mut self, id: FieldId, value: FieldValue) -> Result<(), FieldKindMismatch> {
        let kind = id.descriptor().kind;
        match (id, value) {
            (FieldId::Removed, FieldValue::Flag(b)) => self.removed = b,
            (FieldId::Link, FieldValue::Int(n)) => self.link = decode_record_rrn(n),
            (FieldId::PrimaryKey, FieldValue::Int(n)) => self.primary_key = n,
            (FieldId::LinkedKey, FieldValue::Int(n)) => self.linked_key = n,
            (FieldId::Speed, FieldValue::Int(n)) => self.speed = n,
            (FieldId::CountryCode, FieldValue::Chars(bytes)) => {
                self.country_code = fixed_chars(&bytes);
            }
            (FieldId::SpeedUnit, FieldValue::Chars(bytes)) => {
                self.speed_unit = fixed_chars::<1>(&bytes)[0];
            }
            (FieldId::Name, FieldValue::Text(s)) => self.name = s,
            (FieldId::Country, FieldValue::Text(s)) => self.country = s,
            (field, _) => return Err(FieldKindMismatch { field, expected: kind }),
        }
        Ok(())
    }

    /// Whether a field of this record equals `value`.
    ///
    /// Character arrays compare over the field's fixed width, so `b"B"`
    /// matches a stored `b"B$"`. A value of the wrong kind never matches.
    #[must_use]
    pub fn matches(&self, id: FieldId, value: &FieldValue) -> bool {
        match (self.field(id), value) {
            (FieldValue::Chars(stored), FieldValue::Chars(wanted)) => {
                let width = stored.len();
                let mut padded = vec![FILLER; width];
                let n = wanted.len().min(width);
                padded[..n].copy_from_slice(&wanted[..n]);
                stored == padded
            }
            (stored, wanted) => &stored == wanted,
        }
    }
}

/// Copy bytes into a fixed array, padding with `FILLER`.
fn fixed_chars<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [FILLER; N];
    let n = bytes.len().min(N);
    out[..n].copy_from_slice(&bytes[..n]);
    out
}

/// A generic value was assigned to a field of a different kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldKindMismatch {
    pub field: FieldId,
    pub expected: FieldKind,
}

impl std::fmt::Display for FieldKindMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "field {} expects a {:?} value",
            self.field, self.expected
        )
    }
}

impl std::error::Error for FieldKindMismatch {}
