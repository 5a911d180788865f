//! Remote collaborators for podium.
//!
//! This crate provides the document store abstraction and its backends,
//! the featured-list remote fetcher, and thumbnail downloads used by the
//! reconciler.

pub mod remote;
pub mod store;
pub mod thumbnails;

pub use remote::FeaturedRemote;
pub use store::{DocumentStore, MemoryDocumentStore, RestConfig, RestDocumentStore, StoreError};
pub use thumbnails::{HttpThumbnailSource, ThumbnailConfig, ThumbnailSource};
