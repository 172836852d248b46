//! Sanitizer
//!
//! Cleans caller-supplied field values before they reach disk.
//!
//! Every value is coerced to text, stripped of NUL bytes and surrounding
//! whitespace, and prefixed with `'` when it starts with a spreadsheet
//! formula trigger.

use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::table::Row;

/// Leading characters a spreadsheet treats as the start of a formula
pub const FORMULA_TRIGGERS: [char; 4] = ['=', '+', '-', '@'];

/// Prefix that forces a spreadsheet to read the cell as literal text
pub const NEUTRALIZER: char = '\'';

/// Clean every field of a caller-supplied record.
///
/// The record must be a JSON object; anything else is rejected.
pub fn clean(record: &Value) -> Result<Row> {
    let fields = record.as_object().ok_or_else(|| {
        StoreError::InvalidRecord(format!("expected an object, got {}", kind_of(record)))
    })?;

    Ok(fields
        .iter()
        .map(|(column, value)| (column.trim().to_string(), clean_value(value)))
        .collect())
}

/// Clean a single value
pub fn clean_value(value: &Value) -> String {
    let text = coerce(value).replace('\0', "");
    let text = text.trim();

    if text.starts_with(&FORMULA_TRIGGERS[..]) {
        format!("{NEUTRALIZER}{text}")
    } else {
        text.to_string()
    }
}

/// Text form of a JSON value
fn coerce(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // Compact JSON for nested structures
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
