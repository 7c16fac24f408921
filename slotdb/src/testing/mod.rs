use crate::types::Record;

/// A fully populated live record with the given key.
///
/// Payload fields are derived from the key so different keys produce
/// different slots.
pub fn sample_record(key: i32) -> Record {
    let mut record = Record::new(key);
    record.country_code = *b"BR";
    record.linked_key = key.wrapping_add(1000);
    record.speed_unit = b'M';
    record.speed = key.wrapping_mul(10);
    record.name = format!("router-{key}");
    record.country = "Brasil".to_string();
    record
}
