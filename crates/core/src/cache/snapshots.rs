//! Per-list snapshot files.
//!
//! Snapshots hold the raw remote document exactly as fetched so they can be
//! re-parsed with the same schema-tolerant parser on load.

use std::collections::BTreeMap;

use serde_json::Value;

use super::store::LocalStore;
use crate::Error;
use crate::model::{ListRecord, parse_list_record};

impl LocalStore {
    /// Atomically write the raw snapshot of `list_id`.
    pub async fn write_snapshot(&self, user_id: &str, list_id: &str, bytes: &[u8]) -> Result<(), Error> {
        let path = self.snapshot_path(user_id, list_id)?;
        self.write(bytes, &path).await
    }

    /// Read and parse the snapshot of `list_id`.
    ///
    /// Returns `Ok(None)` when the file does not exist and `Error::Decode`
    /// when it cannot be parsed.
    pub async fn load_snapshot(&self, user_id: &str, list_id: &str) -> Result<Option<ListRecord>, Error> {
        let path = self.snapshot_path(user_id, list_id)?;
        let Some(bytes) = self.read_optional(&path).await? else {
            return Ok(None);
        };
        let raw: Value = serde_json::from_slice(&bytes)?;
        Ok(Some(parse_list_record(list_id, &raw)?))
    }

    /// Load every cached featured list for `user_id`, keyed by slot.
    ///
    /// A missing or undecodable index yields an empty map. Slots whose
    /// snapshot is missing or corrupt are skipped; the rest are returned.
    pub async fn load_cached_lists(&self, user_id: &str) -> BTreeMap<u8, ListRecord> {
        let mut lists = BTreeMap::new();

        let index = match self.load_index(user_id).await {
            Ok(Some(index)) => index,
            Ok(None) => return lists,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "featured index unreadable, treating cache as empty");
                return lists;
            }
        };

        for (slot, list_id) in &index.slots {
            match self.load_snapshot(user_id, list_id).await {
                Ok(Some(record)) => {
                    lists.insert(*slot, record);
                }
                Ok(None) => tracing::debug!(user_id, slot, list_id = %list_id, "no cached snapshot for slot"),
                Err(e) => tracing::warn!(user_id, slot, list_id = %list_id, error = %e, "skipping cached snapshot"),
            }
        }

        lists
    }
}
