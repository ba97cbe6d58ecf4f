use review_harvest_models::{Batch, PersistenceOutcome};
use review_harvest_sources::{extract_reviews, Extractor, PageRenderer};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use crate::error::{ExportError, PipelineError};
use crate::export::{ExportReport, ExportSummary, Exporter};
use crate::persistence::PersistenceCoordinator;
use crate::reporter::{RunReporter, RunStage};

/// How a run ended when it did not fail outright
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    /// Reviews were extracted but an export format failed or records errored
    Degraded,
    /// The page had no review containers; nothing was exported or persisted
    Empty,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub url: String,
    pub status: RunStatus,
    pub fragments_found: usize,
    pub extracted: usize,
    pub convention: Option<String>,
    pub defaulted: BTreeMap<String, usize>,
    pub export: Option<ExportSummary>,
    pub persistence: Option<PersistenceOutcome>,
    pub elapsed_ms: u64,
}

/// Render, extract, then hand the same batch to the exporter and the store.
///
/// Export and persistence are independent: they run side by side on a shared
/// read-only batch and neither sees the other's result.
pub struct ReviewPipeline {
    extractor: Extractor,
    exporter: Option<Arc<Exporter>>,
    persistence: Option<Arc<PersistenceCoordinator>>,
}

impl ReviewPipeline {
    pub fn new(extractor: Extractor) -> Self {
        Self {
            extractor,
            exporter: None,
            persistence: None,
        }
    }

    pub fn with_exporter(mut self, exporter: Exporter) -> Self {
        self.exporter = Some(Arc::new(exporter));
        self
    }

    pub fn with_persistence(mut self, coordinator: PersistenceCoordinator) -> Self {
        self.persistence = Some(Arc::new(coordinator));
        self
    }

    pub async fn run(
        &self,
        renderer: &mut dyn PageRenderer,
        url: &str,
        reporter: &dyn RunReporter,
    ) -> Result<RunSummary, PipelineError> {
        let start = Instant::now();

        reporter.stage(RunStage::Rendering);
        info!(renderer = renderer.renderer_name(), url = %url, "Starting review collection");
        let rendered = renderer.render(url).await;
        if let Err(e) = renderer.shutdown().await {
            warn!("Renderer shutdown failed: {}", e);
        }
        let markup = rendered.map_err(|e| {
            error!("Page rendering failed: {}", e);
            PipelineError::from(e)
        })?;

        reporter.stage(RunStage::Extracting);
        let harvest = extract_reviews(&markup, &self.extractor);
        drop(markup);
        reporter.extracted(harvest.fragments_found, harvest.batch.len());

        let mut summary = RunSummary {
            url: url.to_string(),
            status: RunStatus::Empty,
            fragments_found: harvest.fragments_found,
            extracted: harvest.batch.len(),
            convention: harvest.convention.clone(),
            defaulted: harvest
                .defaulted
                .iter()
                .map(|(field, count)| (field.to_string(), *count))
                .collect(),
            export: None,
            persistence: None,
            elapsed_ms: 0,
        };

        if harvest.is_empty() {
            warn!("No reviews found on the page, nothing to export or save");
            reporter.warning("No reviews found on the page");
            reporter.stage(RunStage::Finished);
            summary.elapsed_ms = start.elapsed().as_millis() as u64;
            return Ok(summary);
        }

        let batch = Arc::new(harvest.batch);
        let (export, persistence) = tokio::join!(self.export(&batch, reporter), self.persist(&batch, reporter));

        let export_failed = export.as_ref().is_some_and(|e| !e.errors.is_empty());
        let records_errored = persistence.as_ref().is_some_and(|p| !p.is_clean());
        summary.status = if export_failed || records_errored {
            RunStatus::Degraded
        } else {
            RunStatus::Completed
        };
        summary.export = export;
        summary.persistence = persistence;
        summary.elapsed_ms = start.elapsed().as_millis() as u64;

        reporter.stage(RunStage::Finished);
        info!(
            status = ?summary.status,
            extracted = summary.extracted,
            elapsed_ms = summary.elapsed_ms,
            "Review collection finished"
        );
        Ok(summary)
    }

    async fn export(&self, batch: &Arc<Batch>, reporter: &dyn RunReporter) -> Option<ExportSummary> {
        let exporter = Arc::clone(self.exporter.as_ref()?);
        reporter.stage(RunStage::Exporting);

        let shared = Arc::clone(batch);
        let report = match tokio::task::spawn_blocking(move || exporter.export(&shared)).await {
            Ok(report) => report,
            Err(e) => {
                error!("Export task failed: {}", e);
                ExportReport {
                    csv: Err(ExportError::Task(e.to_string())),
                    spreadsheet: Err(ExportError::Task(e.to_string())),
                }
            }
        };

        let summary = report.summary();
        for failure in &summary.errors {
            reporter.warning(&format!("Export failed: {}", failure));
        }
        reporter.exported(&summary);
        Some(summary)
    }

    async fn persist(&self, batch: &Arc<Batch>, reporter: &dyn RunReporter) -> Option<PersistenceOutcome> {
        let coordinator = Arc::clone(self.persistence.as_ref()?);
        reporter.stage(RunStage::Persisting);

        let shared = Arc::clone(batch);
        let batch_len = batch.len();
        let outcome = match tokio::task::spawn_blocking(move || coordinator.commit(&shared)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Persistence task failed: {}", e);
                PersistenceOutcome::all_errored(batch_len)
            }
        };

        if outcome.errored > 0 {
            reporter.warning(&format!("{} review(s) could not be saved", outcome.errored));
        }
        reporter.persisted(&outcome);
        Some(outcome)
    }
}
