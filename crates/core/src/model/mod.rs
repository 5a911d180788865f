//! Featured-list data model.
//!
//! Remote documents arrive as loosely typed JSON in one of two schema
//! generations. This module turns them into the strongly typed
//! [`ListRecord`] used everywhere else:
//!
//! - **Nested** records keep their metadata under a `details` object and
//!   their entries under `items`.
//! - **Flat** (legacy) records spell every field at the top level with a
//!   `list` prefix (`listName`, `listUpdated`, `listItems`, ...).
//!
//! Missing optional fields fall back to defaults instead of failing the
//! whole record.

pub mod fields;
pub(crate) mod parse;
mod slots;

pub use parse::{ParseError, parse_list_record};
pub use slots::{MAX_SLOTS, SlotMap, is_valid_slot, parse_slot_map};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Fixed-width timestamp layout used by the remote store (`YYYYMMDDHHMMSS`).
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Colour used when a record carries no category colour.
pub const DEFAULT_CATEGORY_COLOUR: u32 = 0x446D7A;

/// Icon token used when a record carries no category icon.
pub const DEFAULT_CATEGORY_ICON: &str = "circle";

/// Category name used when a record carries no category name.
pub const DEFAULT_CATEGORY_NAME: &str = "Unknown";

/// Presentation style of a ranked list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    /// Plain 1..N ordering.
    #[default]
    Flat,
    /// Items grouped into tiers.
    Tiered,
}

impl ListKind {
    /// Parse the remote type tag. Unknown tags fall back to [`ListKind::Flat`].
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "tier" | "tiered" | "tierlist" => ListKind::Tiered,
            _ => ListKind::Flat,
        }
    }
}

/// Category metadata attached to a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub icon: String,
    /// 24-bit RGB value.
    pub colour: u32,
}

impl Default for Category {
    fn default() -> Self {
        Self {
            name: DEFAULT_CATEGORY_NAME.to_string(),
            icon: DEFAULT_CATEGORY_ICON.to_string(),
            colour: DEFAULT_CATEGORY_COLOUR,
        }
    }
}

/// One entry of a ranked list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    /// 1-based position; presentation order.
    pub rank: i64,
    pub votes: i64,
    pub plays: i64,
    pub name: String,
    pub description: String,
    pub image: String,
    pub gif: String,
    pub video: String,
    pub audio: String,
}

/// A parsed ranked list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: ListKind,
    pub is_public: bool,
    pub category: Category,
    pub creator: String,
    /// Raw `YYYYMMDDHHMMSS` creation timestamp, empty when absent.
    pub created: String,
    /// Raw `YYYYMMDDHHMMSS` update timestamp, empty when absent.
    pub updated: String,
    /// Stable-sorted ascending by rank.
    pub items: Vec<Item>,
}

impl ListRecord {
    /// Parsed creation time, if the raw value is well formed.
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.created)
    }

    /// Parsed update time, if the raw value is well formed.
    pub fn updated_at(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.updated)
    }

    /// The first `n` items in rank order.
    pub fn top_items(&self, n: usize) -> &[Item] {
        &self.items[..n.min(self.items.len())]
    }
}

/// Parse a fixed-width `YYYYMMDDHHMMSS` timestamp.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if raw.len() != 14 {
        return None;
    }
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).ok()
}
