//! Orchestrator: fans records out through the pipeline with bounded concurrency.

use std::sync::Arc;

use catalog_core::{PipelineConfig, RawProduct, Rejection, Result, Vocabulary};
use catalog_translate::TranslationService;
use futures::{future, stream, StreamExt};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::pipeline::RecordPipeline;
use crate::types::{RunError, RunReport};

enum Input {
    Parsed(RawProduct),
    Json(Value),
}

/// Runs a collection of raw records and collects the report.
pub struct Orchestrator {
    pipeline: RecordPipeline,
    concurrency: usize,
    outage_threshold: usize,
}

impl Orchestrator {
    /// `outage_threshold` consecutive records without any translation
    /// response stop the run.
    pub fn new(pipeline: RecordPipeline, concurrency: usize, outage_threshold: usize) -> Self {
        Self {
            pipeline,
            concurrency: concurrency.max(1),
            outage_threshold: outage_threshold.max(1),
        }
    }

    /// Build the pipeline from configuration tables and a translation backend.
    pub fn from_config(
        vocabulary: &Vocabulary,
        config: &PipelineConfig,
        translator: Arc<dyn TranslationService>,
    ) -> Result<Self> {
        let pipeline = RecordPipeline::new(vocabulary, config, translator)?;
        info!(
            "Orchestrator initialized: concurrency={}, translator={}, outage_threshold={}",
            config.concurrency,
            pipeline.translator_name(),
            config.translation.outage_threshold
        );
        Ok(Self::new(
            pipeline,
            config.concurrency,
            config.translation.outage_threshold,
        ))
    }

    pub fn pipeline(&self) -> &RecordPipeline {
        &self.pipeline
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Process typed raw records.
    ///
    /// Output order equals input order. Once `cancel` fires no new record is
    /// scheduled, records already in flight finish, and the report is marked
    /// cancelled. A record the translation service never answered still gets
    /// its diagnostics; only a run of such records counts as an outage.
    pub async fn run(
        &self,
        records: Vec<RawProduct>,
        cancel: CancellationToken,
    ) -> std::result::Result<RunReport, RunError> {
        self.run_inputs(records.into_iter().map(Input::Parsed).collect(), cancel)
            .await
    }

    /// Like [`run`](Self::run), for records that are still untyped JSON.
    /// Values without the raw record shape are rejected individually.
    pub async fn run_json(
        &self,
        records: Vec<Value>,
        cancel: CancellationToken,
    ) -> std::result::Result<RunReport, RunError> {
        self.run_inputs(records.into_iter().map(Input::Json).collect(), cancel)
            .await
    }

    async fn run_inputs(
        &self,
        inputs: Vec<Input>,
        cancel: CancellationToken,
    ) -> std::result::Result<RunReport, RunError> {
        let mut report = RunReport::new(inputs.len());
        info!("Run {} started: {} records", report.run_id, report.total);

        // Stops scheduling on external cancel or on a service outage.
        let stop = cancel.child_token();
        let pipeline = &self.pipeline;

        let outcomes = stream::iter(inputs.into_iter().enumerate())
            .take_while(|_| future::ready(!stop.is_cancelled()))
            .map(|(index, input)| async move {
                match input {
                    Input::Parsed(raw) => pipeline.process(index, &raw).await,
                    Input::Json(value) => pipeline.process_json(index, &value).await,
                }
            })
            .buffered(self.concurrency);
        let mut outcomes = std::pin::pin!(outcomes);

        let mut outage: Option<String> = None;
        let mut unreachable_streak = 0usize;
        while let Some(outcome) = outcomes.next().await {
            match outcome.diagnostics.translation_unreachable.as_deref() {
                Some(reason) => {
                    unreachable_streak += 1;
                    warn!(
                        "Record {}: translation service unreachable ({} in a row): {}",
                        outcome.diagnostics.index, unreachable_streak, reason
                    );
                    if unreachable_streak >= self.outage_threshold && outage.is_none() {
                        error!("Translation service unavailable, stopping run: {}", reason);
                        stop.cancel();
                        outage = Some(format!(
                            "{} consecutive records without a response, last: {}",
                            unreachable_streak, reason
                        ));
                    }
                }
                // Reached localization and got an answer.
                None if matches!(
                    outcome.diagnostics.rejection,
                    None | Some(Rejection::Validation(_))
                ) =>
                {
                    unreachable_streak = 0
                }
                None => {}
            }
            report.push(outcome);
        }

        report.cancelled = cancel.is_cancelled();
        report.finish();

        if report.cancelled {
            warn!(
                "Run {} cancelled after {} of {} records",
                report.run_id,
                report.diagnostics.len(),
                report.total
            );
        }
        info!(
            "Run {} finished: {} accepted, {} rejected, {} skipped",
            report.run_id, report.accepted, report.rejected, report.skipped
        );

        match outage {
            Some(reason) => Err(RunError::ServiceUnavailable {
                reason,
                report: Box::new(report),
            }),
            None => Ok(report),
        }
    }
}
