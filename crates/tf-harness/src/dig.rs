//! Path lookup and coercion over untyped JSON.
//!
//! Digging never fails: an absent path or a value of the wrong type reads as
//! the zero value of the requested type, so assertions can probe optional
//! outputs without aborting a scenario.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Follow `path` from `root`.
///
/// Object keys are matched exactly; a segment that parses as an index selects
/// an array element.
pub fn dig<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(*segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// String at `path`, or `""`.
pub fn dig_string(root: &Value, path: &[&str]) -> String {
    dig(root, path)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Integer at `path`, or `0`. Floating point numbers are truncated.
pub fn dig_int(root: &Value, path: &[&str]) -> i64 {
    match dig(root, path) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| u.min(i64::MAX as u64) as i64))
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        _ => 0,
    }
}

/// Float at `path`, or `0.0`.
pub fn dig_float(root: &Value, path: &[&str]) -> f64 {
    dig(root, path).and_then(Value::as_f64).unwrap_or(0.0)
}

/// Boolean at `path`, or `false`.
pub fn dig_bool(root: &Value, path: &[&str]) -> bool {
    dig(root, path).and_then(Value::as_bool).unwrap_or(false)
}

/// String map at `path`; non-string entries are skipped.
pub fn dig_string_map(root: &Value, path: &[&str]) -> BTreeMap<String, String> {
    match dig(root, path) {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect(),
        _ => BTreeMap::new(),
    }
}

/// Array at `path`, or an empty slice.
pub fn dig_array<'a>(root: &'a Value, path: &[&str]) -> &'a [Value] {
    match dig(root, path) {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    }
}

/// Deserialise the value at `path` into `T`, falling back to `T::default()`.
pub fn dig_as<T: DeserializeOwned + Default>(root: &Value, path: &[&str]) -> T {
    dig(root, path)
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}
