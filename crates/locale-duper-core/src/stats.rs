use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

use crate::progress::{ProgressUpdate, UpdateKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStats {
    pub model_id: String,
    pub model_name: String,
    pub successful: usize,
    pub failed: usize,
    pub total: usize,
    /// Record IDs already counted for this model.
    pub processed: HashSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordError {
    pub model_name: String,
    pub record_id: String,
    pub message: String,
}

/// Running totals for one duplication run, built from the progress stream.
#[derive(Debug, Clone)]
pub struct DuplicationStats {
    /// In the order models were first seen.
    pub models: Vec<ModelStats>,
    pub total_models: usize,
    pub total_records: usize,
    pub successful_records: usize,
    pub failed_records: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub errors: Vec<RecordError>,
}

impl Default for DuplicationStats {
    fn default() -> Self {
        Self::new()
    }
}

impl DuplicationStats {
    pub fn new() -> Self {
        Self {
            models: Vec::new(),
            total_models: 0,
            total_records: 0,
            successful_records: 0,
            failed_records: 0,
            started_at: Utc::now(),
            finished_at: None,
            errors: Vec::new(),
        }
    }

    pub fn fold<'a>(updates: impl IntoIterator<Item = &'a ProgressUpdate>) -> Self {
        let mut stats = Self::new();
        for update in updates {
            stats.apply(update);
        }
        stats
    }

    /// Fold one update in. Counting is keyed on the record ID, so replays are no-ops.
    pub fn apply(&mut self, update: &ProgressUpdate) {
        if self.finished_at.is_some() {
            return;
        }

        let Some(model_id) = update.model_id.as_deref() else {
            return;
        };

        let index = match self.models.iter().position(|m| m.model_id == model_id) {
            Some(index) => index,
            None => {
                self.models.push(ModelStats {
                    model_id: model_id.to_string(),
                    model_name: update
                        .model_name
                        .clone()
                        .unwrap_or_else(|| model_id.to_string()),
                    successful: 0,
                    failed: 0,
                    total: 0,
                    processed: HashSet::new(),
                });
                self.total_models += 1;
                self.models.len() - 1
            }
        };

        if !update.is_record_outcome() {
            return;
        }
        let Some(record_id) = update.record_id.as_deref() else {
            return;
        };

        let model = &mut self.models[index];
        if !model.processed.insert(record_id.to_string()) {
            return;
        }

        model.total += 1;
        self.total_records += 1;
        match update.kind {
            UpdateKind::Success => {
                model.successful += 1;
                self.successful_records += 1;
            }
            UpdateKind::Error => {
                model.failed += 1;
                self.failed_records += 1;
                self.errors.push(RecordError {
                    model_name: model.model_name.clone(),
                    record_id: record_id.to_string(),
                    message: update.message.clone(),
                });
            }
            UpdateKind::Info => {}
        }
    }

    /// Stamp the end time. Later updates are ignored.
    pub fn finish(&mut self) {
        if self.finished_at.is_none() {
            self.finished_at = Some(Utc::now());
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed_records == 0
    }

    pub fn duration(&self) -> Duration {
        self.finished_at.unwrap_or_else(Utc::now) - self.started_at
    }

    pub fn model(&self, model_id: &str) -> Option<&ModelStats> {
        self.models.iter().find(|m| m.model_id == model_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;

    fn model(id: &str, name: &str) -> Model {
        Model {
            id: id.to_string(),
            name: name.to_string(),
            api_key: name.to_lowercase(),
            modular_block: false,
        }
    }

    #[test]
    fn test_counts_success_and_failure() {
        let article = model("m1", "Article");
        let updates = vec![
            ProgressUpdate::info("Processing model: Article").with_model(&article),
            ProgressUpdate::record_succeeded(&article, "r1"),
            ProgressUpdate::record_failed(&article, "r2", "Failed to update record r2"),
        ];
        let stats = DuplicationStats::fold(&updates);

        assert_eq!(stats.total_models, 1);
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.successful_records, 1);
        assert_eq!(stats.failed_records, 1);
        assert!(!stats.all_succeeded());
        assert_eq!(stats.errors[0].record_id, "r2");

        let m = stats.model("m1").unwrap();
        assert_eq!((m.successful, m.failed, m.total), (1, 1, 2));
    }

    #[test]
    fn test_duplicate_update_counted_once() {
        let article = model("m1", "Article");
        let update = ProgressUpdate::record_succeeded(&article, "r1");

        let mut once = DuplicationStats::new();
        once.apply(&update);
        let mut twice = DuplicationStats::new();
        twice.apply(&update);
        twice.apply(&update);

        assert_eq!(once.total_records, twice.total_records);
        assert_eq!(once.successful_records, twice.successful_records);
        assert_eq!(once.models, twice.models);
    }

    #[test]
    fn test_same_record_id_in_two_models() {
        let a = model("m1", "Article");
        let b = model("m2", "Page");
        let stats = DuplicationStats::fold(&[
            ProgressUpdate::record_succeeded(&a, "r1"),
            ProgressUpdate::record_succeeded(&b, "r1"),
        ]);
        assert_eq!(stats.total_models, 2);
        assert_eq!(stats.successful_records, 2);
    }

    #[test]
    fn test_informational_updates_do_not_count() {
        let stats = DuplicationStats::fold(&[
            ProgressUpdate::info("Found 2 models to process").with_progress(5),
            ProgressUpdate::error("Process aborted by user"),
        ]);
        assert_eq!(stats.total_models, 0);
        assert_eq!(stats.total_records, 0);
        assert!(stats.all_succeeded());
    }

    #[test]
    fn test_model_name_falls_back_to_id() {
        let mut update = ProgressUpdate::success("").with_record("r1");
        update.model_id = Some("m7".to_string());
        let stats = DuplicationStats::fold(&[update]);
        assert_eq!(stats.models[0].model_name, "m7");
        assert_eq!(stats.successful_records, 1);
    }

    #[test]
    fn test_frozen_after_finish() {
        let article = model("m1", "Article");
        let mut stats = DuplicationStats::new();
        stats.apply(&ProgressUpdate::record_succeeded(&article, "r1"));
        stats.finish();
        stats.apply(&ProgressUpdate::record_succeeded(&article, "r2"));
        assert_eq!(stats.total_records, 1);
        assert!(stats.duration() >= Duration::zero());
    }
}
