use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute keys that belong to the record envelope rather than its content.
pub const RESERVED_KEYS: &[&str] = &[
    "id",
    "type",
    "meta",
    "created_at",
    "updated_at",
    "is_valid",
    "item_type",
    "creator",
];

/// A content type. Block models are only reachable nested inside other records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub name: String,
    pub api_key: String,
    pub modular_block: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    pub api_key: String,
    pub label: String,
    pub field_type: String,
    pub localized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub model_id: String,
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    /// Ordered; the first entry is the main locale.
    pub locales: Vec<String>,
}

pub fn is_reserved_key(key: &str) -> bool {
    key.starts_with('_') || RESERVED_KEYS.contains(&key)
}
