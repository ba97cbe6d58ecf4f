use indicatif::{ProgressBar, ProgressStyle};
use review_harvest_core::{ExportSummary, RunReporter, RunStage, TracingReporter};
use review_harvest_models::PersistenceOutcome;
use std::io::IsTerminal;
use std::time::Duration;

/// Spinner for interactive terminals; every event is also forwarded to tracing
pub struct RunUI {
    spinner: Option<ProgressBar>,
    log: TracingReporter,
}

impl RunUI {
    pub fn new(enabled: bool) -> Self {
        let interactive = enabled && is_interactive();

        let spinner = interactive.then(|| {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            );
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner
        });

        if !interactive {
            tracing::debug!(
                operation = "ui_init",
                mode = "non_interactive",
                "Progress spinner disabled, using structured logging"
            );
        }

        Self {
            spinner,
            log: TracingReporter,
        }
    }

    fn set_message(&self, msg: String) {
        if let Some(spinner) = &self.spinner {
            spinner.set_message(msg);
        }
    }

    pub fn finish(&self) {
        if let Some(spinner) = &self.spinner {
            spinner.finish_and_clear();
        }
    }
}

impl RunReporter for RunUI {
    fn stage(&self, stage: RunStage) {
        self.set_message(format!("{}...", stage.description()));
        self.log.stage(stage);
    }

    fn extracted(&self, fragments_found: usize, kept: usize) {
        self.set_message(format!("Extracted {} of {} reviews", kept, fragments_found));
        self.log.extracted(fragments_found, kept);
    }

    fn exported(&self, summary: &ExportSummary) {
        self.log.exported(summary);
    }

    fn persisted(&self, outcome: &PersistenceOutcome) {
        self.log.persisted(outcome);
    }

    fn warning(&self, message: &str) {
        if let Some(spinner) = &self.spinner {
            spinner.println(format!("⚠ {}", message));
        }
        self.log.warning(message);
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}
