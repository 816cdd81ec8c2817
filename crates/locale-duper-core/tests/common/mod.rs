#![allow(dead_code)]

use futures::stream::{self, BoxStream, StreamExt};
use locale_duper_core::model::{Field, Model, Record, Site};
use locale_duper_core::{AbortSignal, ContentApi, Error, Result};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub fn model(id: &str, name: &str) -> Model {
    Model {
        id: id.to_string(),
        name: name.to_string(),
        api_key: name.to_lowercase(),
        modular_block: false,
    }
}

pub fn block_model(id: &str, name: &str) -> Model {
    Model {
        modular_block: true,
        ..model(id, name)
    }
}

pub fn record(id: &str, model_id: &str, attributes: Value) -> Record {
    Record {
        id: id.to_string(),
        model_id: model_id.to_string(),
        attributes: attributes.as_object().cloned().unwrap_or_default(),
    }
}

/// In-memory content API that records every call made against it.
#[derive(Default)]
pub struct FakeApi {
    pub locales: Vec<String>,
    pub models: Vec<Model>,
    pub fields: HashMap<String, Vec<Field>>,
    pub records: HashMap<String, Vec<Record>>,
    /// Models whose record stream fails after yielding its records.
    pub failing_models: HashSet<String>,
    /// Records whose update is rejected with a validation error.
    pub rejected_records: HashSet<String>,
    pub fail_list_models: bool,
    /// Abort once the given record has been written.
    pub abort_after: Option<(String, AbortSignal)>,

    pub fetched_models: Mutex<Vec<String>>,
    pub updates: Mutex<Vec<(String, Map<String, Value>)>>,
}

impl FakeApi {
    pub fn new(models: Vec<Model>, records: Vec<Record>) -> Self {
        let mut by_model: HashMap<String, Vec<Record>> = HashMap::new();
        for r in records {
            by_model.entry(r.model_id.clone()).or_default().push(r);
        }
        Self {
            locales: vec!["en".to_string(), "fr".to_string()],
            models,
            records: by_model,
            ..Default::default()
        }
    }

    pub fn fetched_models(&self) -> Vec<String> {
        self.fetched_models.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<(String, Map<String, Value>)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn updated_ids(&self) -> Vec<String> {
        self.updates().into_iter().map(|(id, _)| id).collect()
    }

    fn find_record(&self, record_id: &str) -> Option<&Record> {
        self.records.values().flatten().find(|r| r.id == record_id)
    }
}

impl ContentApi for FakeApi {
    async fn site(&self) -> Result<Site> {
        Ok(Site {
            name: "Test site".to_string(),
            locales: self.locales.clone(),
        })
    }

    async fn list_models(&self) -> Result<Vec<Model>> {
        if self.fail_list_models {
            return Err(Error::Api {
                status: 401,
                body: "invalid token".to_string(),
            });
        }
        Ok(self.models.clone())
    }

    async fn list_fields(&self, model_id: &str) -> Result<Vec<Field>> {
        Ok(self.fields.get(model_id).cloned().unwrap_or_default())
    }

    fn records<'a>(&'a self, model_id: &'a str) -> BoxStream<'a, Result<Record>> {
        self.fetched_models.lock().unwrap().push(model_id.to_string());

        let mut items: Vec<Result<Record>> = self
            .records
            .get(model_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(Ok)
            .collect();
        if self.failing_models.contains(model_id) {
            items.push(Err(Error::Api {
                status: 500,
                body: "page fetch failed".to_string(),
            }));
        }
        stream::iter(items).boxed()
    }

    async fn get_record(&self, record_id: &str) -> Result<Record> {
        self.find_record(record_id).cloned().ok_or_else(|| Error::Api {
            status: 404,
            body: format!("record {record_id} not found"),
        })
    }

    async fn update_record(&self, record_id: &str, attributes: &Map<String, Value>) -> Result<Record> {
        if self.rejected_records.contains(record_id) {
            return Err(Error::Api {
                status: 422,
                body: "INVALID_FIELD".to_string(),
            });
        }

        self.updates
            .lock()
            .unwrap()
            .push((record_id.to_string(), attributes.clone()));

        if let Some((after, signal)) = &self.abort_after {
            if after == record_id {
                signal.abort();
            }
        }

        let mut updated = self
            .find_record(record_id)
            .cloned()
            .unwrap_or_else(|| record(record_id, "", Value::Null));
        for (key, value) in attributes {
            updated.attributes.insert(key.clone(), value.clone());
        }
        Ok(updated)
    }
}
