//! The per-user reconciliation index.
//!
//! The index is the commit marker of a rebuild: it is written last and
//! replaced wholesale, never patched. A missing or unreadable index means a
//! cold cache.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::hash::featured_hash;
use super::store::LocalStore;
use crate::Error;
use crate::model::SlotMap;

/// Local reconciliation anchor for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheIndex {
    /// Digest of `slots`.
    pub featured_hash: String,
    /// List id to content signature.
    pub signatures: BTreeMap<String, String>,
    pub built_at: DateTime<Utc>,
    pub slots: SlotMap,
}

impl CacheIndex {
    /// Build an index for `slots`, hashing the slot map.
    pub fn new(slots: SlotMap, signatures: BTreeMap<String, String>) -> Self {
        Self { featured_hash: featured_hash(&slots), signatures, built_at: Utc::now(), slots }
    }

    /// Stored signature for `list_id`.
    pub fn signature(&self, list_id: &str) -> Option<&str> {
        self.signatures.get(list_id).map(String::as_str)
    }
}

impl LocalStore {
    /// Load the index for `user_id`.
    ///
    /// Absent and undecodable indexes both yield `None`; only unexpected I/O
    /// failures are errors.
    pub async fn load_index(&self, user_id: &str) -> Result<Option<CacheIndex>, Error> {
        let path = self.index_path(user_id)?;
        let Some(bytes) = self.read_optional(&path).await? else {
            return Ok(None);
        };

        match serde_json::from_slice::<CacheIndex>(&bytes) {
            Ok(index) => Ok(Some(index)),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "discarding undecodable featured index");
                Ok(None)
            }
        }
    }

    /// Atomically replace the index for `user_id`.
    pub async fn write_index(&self, user_id: &str, index: &CacheIndex) -> Result<(), Error> {
        let path = self.index_path(user_id)?;
        let bytes = serde_json::to_vec_pretty(index)?;
        self.write(&bytes, &path).await
    }
}
