//! Single-field locale copy, the editor-side counterpart of the bulk engine.
//!
//! Which fields offer the copy action is stored by the host as a JSON array
//! of `{ "modelId": .., "fieldId": .. }` objects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::client::ContentApi;
use crate::error::{Error, Result};
use crate::model::Record;
use crate::strip::strip_block_ids;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCopyRule {
    #[serde(alias = "modelId")]
    pub model_id: String,
    #[serde(alias = "fieldId")]
    pub field_id: String,
}

/// Parse the stored parameter. A missing or `null` parameter means no rules.
pub fn parse_rules(value: &Value) -> Result<Vec<FieldCopyRule>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(raw) => Ok(serde_json::from_str(raw)?),
        other => Ok(serde_json::from_value(other.clone())?),
    }
}

pub fn is_enabled(rules: &[FieldCopyRule], model_id: &str, field_id: &str) -> bool {
    rules
        .iter()
        .any(|r| r.model_id == model_id && r.field_id == field_id)
}

/// Copy `source` into `target` on one localized value without touching the input.
///
/// Returns `None` when the value is not localized or has no `source` entry.
pub fn copy_field_locale(value: &Value, source: &str, target: &str) -> Option<Value> {
    let locales = value.as_object()?;
    let source_value = locales.get(source)?;

    let mut copied = locales.clone();
    copied.insert(target.to_string(), strip_block_ids(source_value));
    Some(Value::Object(copied))
}

/// Copy one field of one record between locales and write it back.
///
/// When `rules` is non-empty the field must be enabled there. Returns `None`
/// without writing when the record has no `source` value for the field.
pub async fn copy_record_field<C: ContentApi>(
    api: &C,
    rules: &[FieldCopyRule],
    record_id: &str,
    field_api_key: &str,
    source: &str,
    target: &str,
) -> Result<Option<Record>> {
    if source == target {
        return Err(Error::InvalidRequest(format!(
            "source and target locale are both '{source}'"
        )));
    }

    let record = api.get_record(record_id).await?;
    let fields = api.list_fields(&record.model_id).await?;
    let field = fields
        .iter()
        .find(|f| f.api_key == field_api_key)
        .ok_or_else(|| {
            Error::InvalidRequest(format!(
                "field '{field_api_key}' does not exist on model {}",
                record.model_id
            ))
        })?;

    if !rules.is_empty() && !is_enabled(rules, &record.model_id, &field.id) {
        return Err(Error::InvalidRequest(format!(
            "copying is not enabled for field '{field_api_key}'"
        )));
    }
    if !field.localized {
        return Err(Error::InvalidRequest(format!(
            "field '{field_api_key}' is not localized"
        )));
    }

    let Some(copied) = record
        .attributes
        .get(field_api_key)
        .and_then(|value| copy_field_locale(value, source, target))
    else {
        return Ok(None);
    };

    let mut update = Map::new();
    update.insert(field_api_key.to_string(), copied);
    let updated = api.update_record(&record.id, &update).await?;
    info!(
        "Copied {} from {} to {} on record {}",
        field_api_key, source, target, record.id
    );
    Ok(Some(updated))
}
