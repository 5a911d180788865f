//! Schema-tolerant parsing of remote list documents.

use serde_json::{Map, Value};

use super::fields::{self, keyed_objects};
use super::{Category, Item, ListKind, ListRecord};

/// Errors produced while turning a raw document into a [`ListRecord`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record matches neither the nested nor the legacy schema")]
    UnrecognizedSchema,

    #[error("record is missing required field `{0}`")]
    MissingField(&'static str),
}

/// The two schema generations a list document can take.
#[derive(Debug, Clone, Copy)]
pub(crate) enum RecordShape<'a> {
    /// Metadata under `details`, entries under `items`.
    Nested { details: &'a Map<String, Value>, root: &'a Map<String, Value> },
    /// Legacy layout: `list`-prefixed keys at the top level.
    Flat { root: &'a Map<String, Value> },
}

impl<'a> RecordShape<'a> {
    /// Classify a raw document, preferring the nested schema.
    pub(crate) fn detect(raw: &'a Value) -> Result<Self, ParseError> {
        let root = raw.as_object().ok_or(ParseError::NotAnObject)?;

        if let Some(details) = root.get("details").and_then(Value::as_object) {
            return Ok(RecordShape::Nested { details, root });
        }

        if root.keys().any(|k| is_legacy_key(k)) {
            return Ok(RecordShape::Flat { root });
        }

        Err(ParseError::UnrecognizedSchema)
    }

    /// Look a field up under its nested name, then its legacy name.
    pub(crate) fn get(&self, nested: &str, legacy: &str) -> Option<&'a Value> {
        match *self {
            RecordShape::Nested { details, root } => details.get(nested).or_else(|| root.get(legacy)),
            RecordShape::Flat { root } => root.get(legacy),
        }
    }

    /// Look a category sub-field up (`details.category.<key>`), then its legacy name.
    fn category_field(&self, key: &str, legacy: &str) -> Option<&'a Value> {
        match *self {
            RecordShape::Nested { details, root } => details
                .get("category")
                .and_then(Value::as_object)
                .and_then(|c| c.get(key))
                .or_else(|| root.get(legacy)),
            RecordShape::Flat { root } => root.get(legacy),
        }
    }

    /// Raw item collection.
    pub(crate) fn items(&self) -> Option<&'a Value> {
        match *self {
            RecordShape::Nested { root, .. } => root.get("items").or_else(|| root.get("listItems")),
            RecordShape::Flat { root } => root.get("listItems").or_else(|| root.get("items")),
        }
    }

    /// Raw update timestamp.
    pub(crate) fn updated(&self) -> Option<&'a Value> {
        self.get("updated", "listUpdated")
    }
}

fn is_legacy_key(key: &str) -> bool {
    key.strip_prefix("list")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase())
}

/// Image URL of a raw item. Older writers used `imageURL`.
pub(crate) fn item_image(obj: &Map<String, Value>) -> String {
    fields::as_string(obj.get("image").or_else(|| obj.get("imageURL"))).unwrap_or_default()
}

/// Rank of a raw item, 0 when absent.
pub(crate) fn item_rank(obj: &Map<String, Value>) -> i64 {
    fields::i64_or(obj.get("rank"), 0)
}

fn parse_item(id: String, obj: &Map<String, Value>) -> Item {
    Item {
        id,
        rank: item_rank(obj),
        votes: fields::i64_or(obj.get("votes"), 0),
        plays: fields::i64_or(obj.get("plays"), 0),
        name: fields::string_or_empty(obj.get("name")),
        description: fields::string_or_empty(obj.get("description")),
        image: item_image(obj),
        gif: fields::string_or_empty(obj.get("gif")),
        video: fields::string_or_empty(obj.get("video")),
        audio: fields::string_or_empty(obj.get("audio")),
    }
}

/// Parse a raw list document into a [`ListRecord`].
///
/// `list_id` is the document key the record was read from; it wins over any
/// id embedded in the body.
pub fn parse_list_record(list_id: &str, raw: &Value) -> Result<ListRecord, ParseError> {
    let shape = RecordShape::detect(raw)?;

    let name = fields::as_string(shape.get("name", "listName")).ok_or(ParseError::MissingField("name"))?;

    let defaults = Category::default();
    let category = Category {
        name: fields::as_string(shape.category_field("name", "listCategoryName")).unwrap_or(defaults.name),
        icon: fields::as_string(shape.category_field("icon", "listCategoryIcon")).unwrap_or(defaults.icon),
        colour: fields::as_colour(shape.category_field("colour", "listCategoryColour")).unwrap_or(defaults.colour),
    };

    let mut items: Vec<Item> = keyed_objects(shape.items())
        .into_iter()
        .map(|(id, obj)| parse_item(id, obj))
        .collect();
    items.sort_by_key(|item| item.rank);

    Ok(ListRecord {
        id: list_id.to_string(),
        name,
        description: fields::string_or_empty(shape.get("description", "listDescription")),
        kind: fields::as_string(shape.get("type", "listType"))
            .map(|tag| ListKind::from_tag(&tag))
            .unwrap_or_default(),
        is_public: fields::as_bool(shape.get("isPublic", "listPublic")).unwrap_or(false),
        category,
        creator: fields::string_or_empty(shape.get("creator", "listCreator")),
        created: fields::string_or_empty(shape.get("created", "listCreated")),
        updated: fields::string_or_empty(shape.updated()),
        items,
    })
}
