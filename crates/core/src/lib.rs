//! Core types and shared functionality for podium.
//!
//! This crate provides:
//! - The featured-list data model and schema-tolerant parsing
//! - Content signatures and the file-backed featured cache
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod model;

pub use cache::{CacheIndex, LocalStore, content_signature, featured_hash};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use model::{Item, ListRecord, SlotMap};
