//! Zero-value convention shared by argument encoding and output digging.
//!
//! A JSON value is "unset" when it is `null`, an empty string, a numeric
//! zero, `false`, an empty array or an empty object. Unset arguments are
//! never passed to Terraform, and an unset or absent output reads back as the
//! zero value of the requested type.

use serde_json::Value;

/// Whether `value` counts as unset.
pub fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map(|f| f == 0.0).unwrap_or(false),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
