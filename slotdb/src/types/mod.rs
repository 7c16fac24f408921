pub mod field;
pub mod ids;
pub mod record;

pub use field::{
    DELIMITER, FIELD_COUNT, FILLER, FieldDescriptor, FieldId, FieldKind, FieldValue, NULL_INT,
    SCHEMA,
};
pub use ids::{EMPTY_RRN, NodeRrn, RecordRrn};
pub use record::{FieldKindMismatch, Record};
