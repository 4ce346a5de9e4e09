//! Entity records: the plain key/value objects rules read and mutate.

use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};

/// A candidate entity. Any domain object (note, product, transaction)
/// is handed to the engine as a flat JSON object.
pub type Record = Map<String, Value>;

/// Key set by a `delete-entity` action. Removing the entity is up to the caller.
pub const MARKED_FOR_DELETION: &str = "_markedForDeletion";

/// Whether a `delete-entity` action has flagged this record.
pub fn is_marked_for_deletion(record: &Record) -> bool {
    record
        .get(MARKED_FOR_DELETION)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Render a field value as plain text, the way template placeholders see it.
///
/// Missing and `null` values render as the empty string; arrays are joined
/// with commas.
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| display_value(Some(v)))
            .collect::<Vec<_>>()
            .join(","),
        Some(obj @ Value::Object(_)) => obj.to_string(),
    }
}

/// Numeric view of a value. Numeric strings are accepted.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Turn an `f64` back into a JSON number, keeping whole numbers integral.
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Parse a date value: `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}
