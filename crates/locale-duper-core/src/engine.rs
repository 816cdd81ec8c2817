use futures::StreamExt;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::abort::AbortSignal;
use crate::client::ContentApi;
use crate::config::{AppConfig, DEFAULT_SETTLE_DELAY_SECS};
use crate::error::{Error, Result};
use crate::model::{is_reserved_key, Model, Record};
use crate::progress::{ProgressReporter, ProgressUpdate};
use crate::strip::strip_block_ids_in_map;

pub const ABORTED_MESSAGE: &str = "Process aborted by user";

const START_PROGRESS: u8 = 5;
const MODEL_PROGRESS_SPAN: f64 = 90.0;

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Pause after the last model so a watching UI can show the completed state.
    pub settle_delay: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(DEFAULT_SETTLE_DELAY_SECS),
        }
    }
}

impl From<&AppConfig> for EngineOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            settle_delay: config.settle_delay(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicationRequest {
    pub source_locale: String,
    pub target_locale: String,
    /// `None` selects every non-block model.
    pub model_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Aborted,
}

/// Copies one locale onto another across every record of the selected models.
///
/// Strictly sequential: one model, one record, one request at a time.
pub struct DuplicationEngine<C> {
    api: C,
    options: EngineOptions,
}

impl<C: ContentApi> DuplicationEngine<C> {
    pub fn new(api: C) -> Self {
        Self {
            api,
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn api(&self) -> &C {
        &self.api
    }

    /// Run the whole duplication:
    /// 1. List models, drop block models, apply the selection
    /// 2. For each model, stream its records and write the copied locale
    /// 3. Report completion after the settle delay
    ///
    /// Record and model failures are reported and skipped. Anything else is
    /// reported as a final error and returned.
    pub async fn run<R>(
        &self,
        request: &DuplicationRequest,
        reporter: &R,
        abort: &AbortSignal,
    ) -> Result<RunOutcome>
    where
        R: ProgressReporter + ?Sized,
    {
        if request.source_locale == request.target_locale {
            return Err(Error::InvalidRequest(format!(
                "source and target locale are both '{}'",
                request.source_locale
            )));
        }

        match self.run_models(request, reporter, abort).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                error!("Duplication failed: {}", err);
                reporter.report(ProgressUpdate::error(format!("Migration failed: {err}")));
                Err(err)
            }
        }
    }

    async fn run_models<R>(
        &self,
        request: &DuplicationRequest,
        reporter: &R,
        abort: &AbortSignal,
    ) -> Result<RunOutcome>
    where
        R: ProgressReporter + ?Sized,
    {
        let models = self.select_models(request.model_ids.as_deref()).await?;
        let total = models.len();
        info!(
            "Duplicating {} -> {} across {} models",
            request.source_locale, request.target_locale, total
        );
        reporter.report(
            ProgressUpdate::info(format!("Found {total} models to process"))
                .with_progress(START_PROGRESS),
        );

        for (index, model) in models.iter().enumerate() {
            if abort.is_aborted() {
                return Ok(self.report_abort(reporter));
            }

            reporter.report(
                ProgressUpdate::info(format!("Processing model: {}", model.name))
                    .with_progress(model_progress(index, total))
                    .with_model(model),
            );

            match self.duplicate_model(model, request, reporter, abort).await {
                Ok(RunOutcome::Completed) => {}
                Ok(RunOutcome::Aborted) => return Ok(RunOutcome::Aborted),
                Err(err) => {
                    warn!("Model {} failed: {}", model.api_key, err);
                    reporter.report(
                        ProgressUpdate::error(format!(
                            "Error processing model {}: {}",
                            model.name, err
                        ))
                        .with_model(model),
                    );
                }
            }
        }

        reporter.report(ProgressUpdate::info("Verifying content migration...").with_progress(100));
        if !self.options.settle_delay.is_zero() {
            tokio::time::sleep(self.options.settle_delay).await;
        }
        reporter.report(
            ProgressUpdate::success("Content migration completed successfully").with_progress(100),
        );
        info!("Duplication completed");

        Ok(RunOutcome::Completed)
    }

    async fn select_models(&self, selected: Option<&[String]>) -> Result<Vec<Model>> {
        let models = self.api.list_models().await?;
        Ok(models
            .into_iter()
            .filter(|m| !m.modular_block)
            .filter(|m| selected.map_or(true, |ids| ids.contains(&m.id)))
            .collect())
    }

    /// Errors from the record stream end the model; update errors do not.
    async fn duplicate_model<R>(
        &self,
        model: &Model,
        request: &DuplicationRequest,
        reporter: &R,
        abort: &AbortSignal,
    ) -> Result<RunOutcome>
    where
        R: ProgressReporter + ?Sized,
    {
        let mut records = self.api.records(&model.id);

        loop {
            if abort.is_aborted() {
                return Ok(self.report_abort(reporter));
            }
            let Some(record) = records.next().await else {
                break;
            };
            let record = record?;

            let update = build_update(&record, &request.source_locale, &request.target_locale);
            if update.is_empty() {
                debug!("Record {} has nothing to copy", record.id);
                continue;
            }

            match self.api.update_record(&record.id, &update).await {
                Ok(_) => {
                    debug!("Updated record {} ({} fields)", record.id, update.len());
                    reporter.report(ProgressUpdate::record_succeeded(model, &record.id));
                }
                Err(err) => {
                    debug!("Failed to update record {}: {}", record.id, err);
                    reporter.report(ProgressUpdate::record_failed(
                        model,
                        &record.id,
                        format!("Failed to update record {}: {}", record.id, err),
                    ));
                }
            }
        }

        Ok(RunOutcome::Completed)
    }

    fn report_abort<R>(&self, reporter: &R) -> RunOutcome
    where
        R: ProgressReporter + ?Sized,
    {
        info!("Abort requested, stopping");
        reporter.report(ProgressUpdate::error(ABORTED_MESSAGE));
        RunOutcome::Aborted
    }
}

fn model_progress(index: usize, total: usize) -> u8 {
    if total == 0 {
        return START_PROGRESS;
    }
    let offset = (index as f64 / total as f64 * MODEL_PROGRESS_SPAN).round();
    START_PROGRESS + offset as u8
}

/// The attributes to write back for one record: every localized field that has
/// a `source` value gets it copied to `target`, with block IDs stripped.
///
/// The whole localized object is sent so the other locales are preserved.
pub fn build_update(record: &Record, source: &str, target: &str) -> Map<String, Value> {
    let mut update = Map::new();

    for (key, value) in &record.attributes {
        if is_reserved_key(key) {
            continue;
        }
        let Some(locales) = value.as_object() else {
            continue;
        };
        let Some(source_value) = locales.get(source) else {
            continue;
        };

        let mut localized = locales.clone();
        localized.insert(target.to_string(), source_value.clone());
        update.insert(key.clone(), Value::Object(localized));
    }

    strip_block_ids_in_map(&mut update);
    update
}
