//! Removal of block identifiers from localized values.
//!
//! Nested blocks carry IDs that belong to the locale they were created in.
//! Writing the same IDs into another locale makes the content API reject the
//! update as a duplicate, so every copied value goes through one of these
//! functions first. Blocks appear in two shapes:
//!
//! - structured text nodes: `{ "type": "block", "item": { "id": .., .. } }`
//! - modular content entries: `{ "type": "item", "id": .., .. }`
//!
//! Any other object keeps its `id`.

use serde_json::{Map, Value};

/// Returns a copy of `value` with block identifiers removed. `value` is untouched.
pub fn strip_block_ids(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(strip_block_ids).collect()),
        Value::Object(map) => Value::Object(strip_object(map, false)),
        other => other.clone(),
    }
}

fn strip_object(map: &Map<String, Value>, drop_id: bool) -> Map<String, Value> {
    let tag = map.get("type").and_then(Value::as_str);
    let drop_id = drop_id || tag == Some("item");

    map.iter()
        .filter(|(key, _)| !(drop_id && key.as_str() == "id"))
        .map(|(key, child)| {
            let child = match (tag, key.as_str(), child) {
                (Some("block"), "item", Value::Object(item)) => {
                    Value::Object(strip_object(item, true))
                }
                _ => strip_block_ids(child),
            };
            (key.clone(), child)
        })
        .collect()
}

/// In-place variant for large trees that are not shared with anyone else.
pub fn strip_block_ids_in_place(value: &mut Value) {
    match value {
        Value::Array(items) => items.iter_mut().for_each(strip_block_ids_in_place),
        Value::Object(map) => {
            let tag = map.get("type").and_then(Value::as_str);
            let is_block = tag == Some("block");
            let is_item = tag == Some("item");

            if is_block {
                if let Some(Value::Object(item)) = map.get_mut("item") {
                    item.remove("id");
                }
            }
            if is_item {
                map.remove("id");
            }
            map.values_mut().for_each(strip_block_ids_in_place);
        }
        _ => {}
    }
}

/// Strips every value of an attribute map. Keys are field names, never tags.
pub fn strip_block_ids_in_map(map: &mut Map<String, Value>) {
    map.values_mut().for_each(strip_block_ids_in_place);
}
