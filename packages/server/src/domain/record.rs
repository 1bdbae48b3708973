//! The record: one decoded structured message.

use serde_json::{Map, Value};

/// A JSON object, the only unit of meaning on the wire.
pub type Record = Map<String, Value>;

/// Parse a string as a record, returning `None` unless it holds a JSON object.
pub fn record_from_str(text: &str) -> Option<Record> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(record)) => Some(record),
        _ => None,
    }
}

/// Normalize an arbitrary stored message into a record.
///
/// - nothing stored yields an empty record
/// - an object is returned as-is
/// - a string holding a JSON object is parsed
/// - any other string is wrapped as `{"raw": <string>}`
/// - any other value is wrapped as `{"raw": <value>}`
pub fn normalize_record(message: Option<Value>) -> Record {
    match message {
        None | Some(Value::Null) => Record::new(),
        Some(Value::Object(record)) => record,
        Some(Value::String(text)) => record_from_str(&text).unwrap_or_else(|| raw(Value::String(text))),
        Some(other) => raw(other),
    }
}

fn raw(value: Value) -> Record {
    let mut record = Record::new();
    record.insert("raw".to_string(), value);
    record
}
