pub mod error;
pub mod export;
pub mod persistence;
pub mod pipeline;
pub mod reporter;

pub use error::{ExportError, PipelineError, StoreError};
pub use export::{ExportReport, ExportSummary, Exporter};
pub use persistence::{CommitTally, InsertOutcome, PersistenceCoordinator, ReviewSession, SqliteConnector, StoreConnector};
pub use pipeline::{ReviewPipeline, RunStatus, RunSummary};
pub use reporter::{RunReporter, RunStage, TracingReporter};
