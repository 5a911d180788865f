//! Featured-list reads and slot mutations against the document store.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::store::{DocumentStore, paths};
use podium_core::model::{MAX_SLOTS, SlotMap, is_valid_slot, parse_slot_map};
use podium_core::Error;

/// Remote side of the featured cache.
///
/// Reads distinguish "legitimately empty" (`Ok` with an empty map or `None`)
/// from "could not ask" (`Err`), so the reconciler can decide whether to
/// serve stale data.
#[derive(Clone)]
pub struct FeaturedRemote {
    store: Arc<dyn DocumentStore>,
}

impl FeaturedRemote {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Underlying document store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Fetch the user's slot assignments. A missing node is an empty map.
    pub async fn fetch_slot_map(&self, user_id: &str) -> Result<SlotMap, Error> {
        let raw = self.store.read(&paths::featured_slots(user_id)).await?;
        let slots = raw.as_ref().map(parse_slot_map).unwrap_or_default();
        tracing::debug!(user_id, slots = slots.len(), "fetched featured slot map");
        Ok(slots)
    }

    /// Fetch the raw document of `list_id`. `None` if the list was deleted.
    pub async fn fetch_list_record(&self, list_id: &str) -> Result<Option<Value>, Error> {
        let raw = self.store.read(&paths::list(list_id)).await?;
        if raw.is_none() {
            tracing::debug!(list_id, "featured list not found");
        }
        Ok(raw)
    }

    /// Pin `list_id` to `slot`, replacing whatever was pinned there.
    pub async fn pin_slot(&self, user_id: &str, slot: u8, list_id: &str) -> Result<(), Error> {
        check_slot(slot)?;
        if list_id.is_empty() {
            return Err(Error::InvalidInput("list id must not be empty".into()));
        }
        let mut fields = Map::new();
        fields.insert(slot.to_string(), Value::String(list_id.to_string()));
        self.store.update(&paths::featured_slots(user_id), fields).await?;
        tracing::info!(user_id, slot, list_id, "pinned featured list");
        Ok(())
    }

    /// Unpin `slot`. The slot key is removed rather than set to null.
    pub async fn unpin_slot(&self, user_id: &str, slot: u8) -> Result<(), Error> {
        check_slot(slot)?;
        self.store.remove(&paths::featured_slot(user_id, slot)).await?;
        tracing::info!(user_id, slot, "unpinned featured list");
        Ok(())
    }
}

fn check_slot(slot: u8) -> Result<(), Error> {
    if !is_valid_slot(slot) {
        return Err(Error::InvalidInput(format!("slot {slot} outside 1..={MAX_SLOTS}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;
    use serde_json::json;

    fn remote_with(root: Value) -> (FeaturedRemote, Arc<MemoryDocumentStore>) {
        let store = Arc::new(MemoryDocumentStore::from_value(root));
        (FeaturedRemote::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_fetch_slot_map_missing_is_empty() {
        let (remote, _) = remote_with(json!({}));
        assert!(remote.fetch_slot_map("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_slot_map_offline_is_error() {
        let (remote, store) = remote_with(json!({}));
        store.set_offline(true);
        assert!(matches!(remote.fetch_slot_map("u1").await, Err(Error::Unreachable(_))));
    }

    #[tokio::test]
    async fn test_fetch_list_record() {
        let (remote, _) = remote_with(json!({"lists": {"listA": {"details": {"name": "A"}}}}));
        assert!(remote.fetch_list_record("listA").await.unwrap().is_some());
        assert!(remote.fetch_list_record("gone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pin_and_unpin() {
        let (remote, _) = remote_with(json!({}));
        remote.pin_slot("u1", 1, "listA").await.unwrap();
        remote.pin_slot("u1", 2, "listB").await.unwrap();
        remote.pin_slot("u1", 1, "listC").await.unwrap();

        let slots = remote.fetch_slot_map("u1").await.unwrap();
        assert_eq!(slots.get(&1).map(String::as_str), Some("listC"));
        assert_eq!(slots.get(&2).map(String::as_str), Some("listB"));

        remote.unpin_slot("u1", 2).await.unwrap();
        let slots = remote.fetch_slot_map("u1").await.unwrap();
        assert_eq!(slots.len(), 1);
        assert!(!slots.contains_key(&2));
    }

    #[tokio::test]
    async fn test_pin_rejects_bad_input() {
        let (remote, _) = remote_with(json!({}));
        assert!(matches!(remote.pin_slot("u1", 0, "listA").await, Err(Error::InvalidInput(_))));
        assert!(matches!(remote.pin_slot("u1", 11, "listA").await, Err(Error::InvalidInput(_))));
        assert!(matches!(remote.pin_slot("u1", 3, "").await, Err(Error::InvalidInput(_))));
        assert!(matches!(remote.unpin_slot("u1", 11).await, Err(Error::InvalidInput(_))));
    }
}
