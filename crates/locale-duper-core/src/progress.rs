use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

use crate::model::Model;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateKind {
    Info,
    Success,
    Error,
}

/// One event emitted by the duplication engine. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: UpdateKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

impl ProgressUpdate {
    fn new(kind: UpdateKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            timestamp: Utc::now(),
            progress: None,
            model_id: None,
            model_name: None,
            record_id: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(UpdateKind::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(UpdateKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(UpdateKind::Error, message)
    }

    /// Stats-only signal for a record that was written.
    pub fn record_succeeded(model: &Model, record_id: &str) -> Self {
        Self::success(String::new()).with_model(model).with_record(record_id)
    }

    pub fn record_failed(model: &Model, record_id: &str, message: impl Into<String>) -> Self {
        Self::error(message).with_model(model).with_record(record_id)
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress.min(100));
        self
    }

    pub fn with_model(mut self, model: &Model) -> Self {
        self.model_id = Some(model.id.clone());
        self.model_name = Some(model.name.clone());
        self
    }

    pub fn with_record(mut self, record_id: &str) -> Self {
        self.record_id = Some(record_id.to_string());
        self
    }

    /// True for events that carry a per-record outcome the stats should count.
    pub fn is_record_outcome(&self) -> bool {
        self.record_id.is_some() && self.kind != UpdateKind::Info
    }

    /// The line a console should show, or `None` for pure stats signals.
    pub fn display_message(&self) -> Option<&str> {
        if self.message.is_empty() {
            None
        } else {
            Some(&self.message)
        }
    }
}

/// Observer the engine writes progress to.
///
/// The CLI subscribes through a channel; tests collect into a [`ProgressLog`].
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn report(&self, _update: ProgressUpdate) {}
}

impl ProgressReporter for UnboundedSender<ProgressUpdate> {
    fn report(&self, update: ProgressUpdate) {
        // A closed receiver means nobody is watching anymore; the run goes on.
        let _ = self.send(update);
    }
}

/// Ordered in-memory log of every update.
#[derive(Default)]
pub struct ProgressLog {
    entries: Mutex<Vec<ProgressUpdate>>,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<ProgressUpdate> {
        self.entries
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl ProgressReporter for ProgressLog {
    fn report(&self, update: ProgressUpdate) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.push(update);
        }
    }
}
