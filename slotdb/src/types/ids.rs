//! Relative record numbers for table slots and index nodes.
//!
//! Both files are arenas of fixed-size pages, so an RRN is an index into one
//! of them. The two kinds are separate types so a slot address can never be
//! used where a node address is expected.
//!
//! # Invariants
//!
//! - On disk, "no RRN" is the signed sentinel `-1`. In memory it is `None`.
//!   Conversion happens only through the `encode_*_rrn` / `decode_*_rrn`
//!   helpers at the codec boundary.

use std::fmt;

/// On-disk sentinel for "no RRN" (empty free list, empty tree, missing child).
pub const EMPTY_RRN: i32 = -1;

/// Address of a record slot in a table file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RecordRrn(pub u32);

/// Address of a node page in an index file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NodeRrn(pub u32);

macro_rules! rrn_impls {
    ($name:ident, $encode:ident, $decode:ident) => {
        impl $name {
            /// The zero-based index as a `u64`, for offset arithmetic.
            #[must_use]
            pub const fn index(self) -> u64 {
                self.0 as u64
            }

            /// The next RRN after this one.
            #[must_use]
            pub const fn next(self) -> Self {
                Self(self.0 + 1)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }

        /// Convert an optional RRN to its on-disk representation.
        #[must_use]
        #[allow(clippy::cast_possible_wrap)]
        pub const fn $encode(rrn: Option<$name>) -> i32 {
            match rrn {
                Some(rrn) => rrn.0 as i32,
                None => EMPTY_RRN,
            }
        }

        /// Convert an on-disk RRN to its in-memory form.
        ///
        /// Every negative value is treated as "no RRN".
        #[must_use]
        #[allow(clippy::cast_sign_loss)]
        pub const fn $decode(raw: i32) -> Option<$name> {
            if raw < 0 { None } else { Some($name(raw as u32)) }
        }
    };
}

rrn_impls!(RecordRrn, encode_record_rrn, decode_record_rrn);
rrn_impls!(NodeRrn, encode_node_rrn, decode_node_rrn);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_roundtrip() {
        assert_eq!(encode_record_rrn(None), -1);
        assert_eq!(decode_record_rrn(-1), None);
        assert_eq!(encode_node_rrn(Some(NodeRrn(7))), 7);
        assert_eq!(decode_node_rrn(7), Some(NodeRrn(7)));
    }

    #[test]
    fn test_next_and_display() {
        let rrn = RecordRrn(41);
        assert_eq!(rrn.next(), RecordRrn(42));
        assert_eq!(rrn.to_string(), "41");
        assert_eq!(NodeRrn(3).index(), 3);
    }
}
