use review_harvest_sources::RenderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached at all; the whole batch is lost for this run
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A single record broke a constraint other than the identity hash
    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("commit failed: {0}")]
    Commit(String),

    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Short label used to group failures in commit summaries
    pub fn category(&self) -> &'static str {
        match self {
            StoreError::Unavailable(_) => "unavailable",
            StoreError::Constraint(_) => "constraint",
            StoreError::Commit(_) => "commit",
            StoreError::Database(_) => "database",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("export task failed: {0}")]
    Task(String),
}

/// The only failures that end a run. Everything else is absorbed where it
/// happens and shows up in the run summary.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl PipelineError {
    pub fn is_timeout(&self) -> bool {
        match self {
            PipelineError::Render(e) => e.is_timeout(),
        }
    }
}
