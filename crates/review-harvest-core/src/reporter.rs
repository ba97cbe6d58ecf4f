use review_harvest_models::PersistenceOutcome;
use std::fmt;
use tracing::{info, warn};
use crate::export::ExportSummary;

/// Pipeline stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Rendering,
    Extracting,
    Exporting,
    Persisting,
    Finished,
}

impl RunStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStage::Rendering => "rendering",
            RunStage::Extracting => "extracting",
            RunStage::Exporting => "exporting",
            RunStage::Persisting => "persisting",
            RunStage::Finished => "finished",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RunStage::Rendering => "Loading review page",
            RunStage::Extracting => "Extracting reviews",
            RunStage::Exporting => "Writing export files",
            RunStage::Persisting => "Saving to database",
            RunStage::Finished => "Done",
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives progress events from a pipeline run. Every method defaults to a no-op.
pub trait RunReporter: Send + Sync {
    fn stage(&self, _stage: RunStage) {}

    fn extracted(&self, _fragments_found: usize, _kept: usize) {}

    fn exported(&self, _summary: &ExportSummary) {}

    fn persisted(&self, _outcome: &PersistenceOutcome) {}

    fn warning(&self, _message: &str) {}
}

/// Reports through structured log events; used when no terminal UI is attached
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl RunReporter for TracingReporter {
    fn stage(&self, stage: RunStage) {
        info!(operation = "stage", stage = %stage, "{}", stage.description());
    }

    fn extracted(&self, fragments_found: usize, kept: usize) {
        info!(operation = "extract", fragments_found, kept, "Extracted reviews");
    }

    fn exported(&self, summary: &ExportSummary) {
        info!(
            operation = "export",
            files = summary.files.len(),
            errors = summary.errors.len(),
            "Export finished"
        );
    }

    fn persisted(&self, outcome: &PersistenceOutcome) {
        info!(
            operation = "persist",
            inserted = outcome.inserted,
            duplicate = outcome.duplicate,
            errored = outcome.errored,
            "Persistence finished"
        );
    }

    fn warning(&self, message: &str) {
        warn!(operation = "warning", "{}", message);
    }
}
