//! Record schema and typed field values.
//!
//! Every record has the same nine fields in the same order. The order and
//! on-disk width of each field is fixed by [`SCHEMA`], which the codec and
//! the name lookup both read.

use std::fmt;

/// Number of fields in a record.
pub const FIELD_COUNT: usize = 9;

/// Byte used to fill unset character arrays and unused slot space.
pub const FILLER: u8 = b'$';

/// Byte terminating a variable-length text field.
pub const DELIMITER: u8 = b'|';

/// Integer payload value meaning "no value".
pub const NULL_INT: i32 = -1;

/// Field identifiers in on-disk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum FieldId {
    Removed = 0,
    Link = 1,
    PrimaryKey = 2,
    CountryCode = 3,
    LinkedKey = 4,
    SpeedUnit = 5,
    Speed = 6,
    Name = 7,
    Country = 8,
}

impl FieldId {
    /// All field identifiers, in on-disk order.
    pub const ALL: [Self; FIELD_COUNT] = [
        Self::Removed,
        Self::Link,
        Self::PrimaryKey,
        Self::CountryCode,
        Self::LinkedKey,
        Self::SpeedUnit,
        Self::Speed,
        Self::Name,
        Self::Country,
    ];

    /// Position of this field in the record.
    #[must_use]
    pub const fn position(self) -> usize {
        self as usize
    }

    /// Schema entry for this field.
    #[must_use]
    pub fn descriptor(self) -> &'static FieldDescriptor {
        &SCHEMA[self.position()]
    }

    /// Resolve a field by its schema name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        SCHEMA.iter().find(|d| d.name == name).map(|d| d.id)
    }

    /// Number of fields from this one (inclusive) to the end of the record.
    #[must_use]
    pub const fn fields_remaining(self) -> usize {
        FIELD_COUNT - self.position()
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().name)
    }
}

/// On-disk kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// One byte, `'1'` or `'0'`.
    Flag,
    /// Four bytes, little-endian signed.
    Int,
    /// Fixed number of raw bytes.
    Chars(usize),
    /// Raw bytes terminated by [`DELIMITER`].
    Text,
}

impl FieldKind {
    /// Exact on-disk width, or `None` for variable-length text.
    #[must_use]
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            Self::Flag => Some(1),
            Self::Int => Some(4),
            Self::Chars(width) => Some(width),
            Self::Text => None,
        }
    }
}

/// One entry of the record schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub id: FieldId,
    pub name: &'static str,
    pub kind: FieldKind,
}

/// The record layout.
pub static SCHEMA: [FieldDescriptor; FIELD_COUNT] = [
    FieldDescriptor {
        id: FieldId::Removed,
        name: "removed",
        kind: FieldKind::Flag,
    },
    FieldDescriptor {
        id: FieldId::Link,
        name: "link",
        kind: FieldKind::Int,
    },
    FieldDescriptor {
        id: FieldId::PrimaryKey,
        name: "primary_key",
        kind: FieldKind::Int,
    },
    FieldDescriptor {
        id: FieldId::CountryCode,
        name: "country_code",
        kind: FieldKind::Chars(2),
    },
    FieldDescriptor {
        id: FieldId::LinkedKey,
        name: "linked_key",
        kind: FieldKind::Int,
    },
    FieldDescriptor {
        id: FieldId::SpeedUnit,
        name: "speed_unit",
        kind: FieldKind::Chars(1),
    },
    FieldDescriptor {
        id: FieldId::Speed,
        name: "speed",
        kind: FieldKind::Int,
    },
    FieldDescriptor {
        id: FieldId::Name,
        name: "name",
        kind: FieldKind::Text,
    },
    FieldDescriptor {
        id: FieldId::Country,
        name: "country",
        kind: FieldKind::Text,
    },
];

/// A single decoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Flag(bool),
    Int(i32),
    Chars(Vec<u8>),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Chars(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
            Self::Text(s) => f.write_str(s),
        }
    }
}
