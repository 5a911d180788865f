//! File-backed mirror of a user's featured lists.
//!
//! This module provides the local half of the featured-list cache:
//!
//! - Content signatures and featured hashes for change detection
//! - A per-user reconciliation index that acts as the commit marker
//! - Raw per-list snapshots, re-parsed on load
//! - Thumbnails for the top-ranked items
//! - Atomic (temp file + rename) writes and idempotent eviction

pub mod hash;
pub mod index;
pub mod snapshots;
pub mod store;
pub mod thumbnails;

pub use crate::Error;

pub use hash::{content_signature, featured_hash};
pub use index::CacheIndex;
pub use store::LocalStore;
pub use thumbnails::MAX_THUMBNAILS_PER_LIST;
