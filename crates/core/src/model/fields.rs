//! Default-supplying accessors over loosely typed JSON.
//!
//! Remote records have been written by several client generations, so a
//! numeric field may arrive as a number or as a numeric string, and a flag
//! as a bool, `"true"` or `1`. Every read goes through one of these helpers.

use serde_json::{Map, Value};

/// String value, with numbers rendered in decimal. `None` for other types.
pub fn as_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// String value or the empty string.
pub fn string_or_empty(value: Option<&Value>) -> String {
    as_string(value).unwrap_or_default()
}

/// Integer value from a number (truncated) or a numeric string.
pub fn as_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Integer value or `default`.
pub fn i64_or(value: Option<&Value>, default: i64) -> i64 {
    as_i64(value).unwrap_or(default)
}

/// Boolean from a bool, `"true"`/`"false"`, or a 0/1 number.
pub fn as_bool(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        _ => None,
    }
}

/// 24-bit colour from a number or a hex string (`#446D7A`, `0x446D7A`, `446D7A`).
pub fn as_colour(value: Option<&Value>) -> Option<u32> {
    let raw = match value? {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok())?,
        Value::String(s) => {
            let s = s.trim();
            let hex = s
                .strip_prefix('#')
                .or_else(|| s.strip_prefix("0x"))
                .or_else(|| s.strip_prefix("0X"))
                .unwrap_or(s);
            u32::from_str_radix(hex, 16).ok()?
        }
        _ => return None,
    };
    Some(raw & 0x00FF_FFFF)
}

/// Object entries of a collection that may be stored either as a map keyed by
/// id or as an array of objects. Array entries use their `id` field, falling
/// back to the array index. Non-object entries (such as `null` holes) are skipped.
pub fn keyed_objects(value: Option<&Value>) -> Vec<(String, &Map<String, Value>)> {
    match value {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(key, v)| v.as_object().map(|obj| (key.clone(), obj)))
            .collect(),
        Some(Value::Array(entries)) => entries
            .iter()
            .enumerate()
            .filter_map(|(idx, v)| {
                let obj = v.as_object()?;
                let id = as_string(obj.get("id")).unwrap_or_else(|| idx.to_string());
                Some((id, obj))
            })
            .collect(),
        _ => Vec::new(),
    }
}
