//! Document store collaborator.
//!
//! The featured cache only needs path-addressed JSON reads and a handful of
//! writes, so the backend is hidden behind the [`DocumentStore`] trait:
//!
//! - `read(path)` returns `Ok(None)` when nothing is stored at `path`,
//!   which is distinct from a failed read.
//! - `write` replaces the value at `path`, `update` merges top-level
//!   fields into it, `remove` deletes it.
//!
//! Two implementations ship: [`RestDocumentStore`] speaks a JSON-over-HTTP
//! tree API, [`MemoryDocumentStore`] keeps the tree in process.

pub mod error;
pub mod memory;
pub mod rest;

pub use error::StoreError;
pub use memory::MemoryDocumentStore;
pub use rest::{RestConfig, RestDocumentStore};

use async_trait::async_trait;
use serde_json::{Map, Value};

/// Path-addressed JSON document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the value at `path`, `None` if absent.
    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the value at `path`.
    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Merge `fields` into the object at `path`, creating it if needed.
    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError>;

    /// Delete the value at `path`. Removing an absent path succeeds.
    async fn remove(&self, path: &str) -> Result<(), StoreError>;
}

/// Document paths used by the featured cache.
pub mod paths {
    /// Slot assignment node of a user.
    pub fn featured_slots(user_id: &str) -> String {
        format!("users/{user_id}/featured-slots")
    }

    /// One slot inside a user's slot assignment node.
    pub fn featured_slot(user_id: &str, slot: u8) -> String {
        format!("users/{user_id}/featured-slots/{slot}")
    }

    /// Full list document.
    pub fn list(list_id: &str) -> String {
        format!("lists/{list_id}")
    }
}

/// Split a store path into its non-empty segments, rejecting traversal.
pub(crate) fn segments(path: &str) -> Result<Vec<&str>, StoreError> {
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if parts.is_empty() {
        return Err(StoreError::InvalidPath(format!("{path:?} is empty")));
    }
    if parts.iter().any(|p| *p == "." || *p == ".." || p.contains(['#', '$', '[', ']'])) {
        return Err(StoreError::InvalidPath(format!("{path:?} contains a forbidden segment")));
    }
    Ok(parts)
}
