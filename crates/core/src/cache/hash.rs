//! Change-detection digests for featured lists.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::model::SlotMap;
use crate::model::fields::{self, keyed_objects};
use crate::model::parse::{RecordShape, item_image, item_rank};

/// Compute the content signature of a raw list document.
///
/// The digest covers the update timestamp and every item's
/// `(rank, image, id)` triple, sorted by rank so map iteration order
/// never leaks into the result. Missing fields default instead of failing.
pub fn content_signature(raw: &Value) -> String {
    let (updated, items) = match RecordShape::detect(raw) {
        Ok(shape) => (shape.updated(), shape.items()),
        Err(_) => (raw.get("updated"), raw.get("items")),
    };
    let updated = fields::string_or_empty(updated);

    let mut triples: Vec<(i64, String, String)> = keyed_objects(items)
        .into_iter()
        .map(|(id, obj)| (item_rank(obj), item_image(obj), id))
        .collect();
    triples.sort_by_key(|(rank, _, _)| *rank);

    let body = triples
        .iter()
        .map(|(rank, image, id)| format!("{rank}\t{image}\t{id}"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut hasher = Sha256::new();
    if !updated.is_empty() {
        hasher.update(updated.as_bytes());
        hasher.update(b"\n");
    }
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compute the featured hash of a slot assignment map.
///
/// `SlotMap` iterates in slot order, so the encoding is canonical.
pub fn featured_hash(slots: &SlotMap) -> String {
    let encoded = slots
        .iter()
        .map(|(slot, list_id)| format!("{slot}={list_id}"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut hasher = Sha256::new();
    hasher.update(encoded.as_bytes());
    hex::encode(hasher.finalize())
}
