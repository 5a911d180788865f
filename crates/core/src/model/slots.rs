//! Featured slot assignments.

use std::collections::BTreeMap;

use serde_json::Value;

use super::fields;

/// Highest slot number a user can pin a list to.
pub const MAX_SLOTS: u8 = 10;

/// Slot number (1..=10) to list id.
pub type SlotMap = BTreeMap<u8, String>;

/// Whether `slot` is a pin position.
pub fn is_valid_slot(slot: u8) -> bool {
    (1..=MAX_SLOTS).contains(&slot)
}

/// Parse a remote featured-slots node.
///
/// Stores that coerce small integer keys into arrays hand back
/// `[null, "listA", "listB"]` for `{1: "listA", 2: "listB"}`, so both
/// shapes are accepted. Out-of-range slots and non-string values are skipped.
pub fn parse_slot_map(raw: &Value) -> SlotMap {
    let entries: Vec<(String, &Value)> = match raw {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(values) => values.iter().enumerate().map(|(i, v)| (i.to_string(), v)).collect(),
        _ => Vec::new(),
    };

    let mut slots = SlotMap::new();
    for (key, value) in entries {
        if value.is_null() {
            continue;
        }
        let slot = match key.trim().parse::<u8>() {
            Ok(slot) if is_valid_slot(slot) => slot,
            _ => {
                tracing::warn!(slot = %key, "ignoring out-of-range featured slot");
                continue;
            }
        };
        match fields::as_string(Some(value)) {
            Some(list_id) if !list_id.is_empty() => {
                slots.insert(slot, list_id);
            }
            _ => tracing::warn!(slot, "ignoring featured slot without a list id"),
        }
    }
    slots
}
