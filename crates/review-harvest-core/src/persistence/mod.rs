pub mod sqlite;
pub mod tally;

pub use sqlite::SqliteConnector;
pub use tally::CommitTally;

use review_harvest_models::{Batch, PersistenceOutcome, Review};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use crate::error::StoreError;

/// What an insert-or-skip did with one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with the same identity hash already exists and was left untouched
    Duplicate,
}

/// One open connection to the durable store, used for a single commit
pub trait ReviewSession {
    fn begin(&mut self) -> Result<(), StoreError>;

    /// Insert unless the identity hash already exists.
    ///
    /// A failure must leave the session usable for the next record.
    fn insert_or_skip(&mut self, review: &Review) -> Result<InsertOutcome, StoreError>;

    fn commit(&mut self) -> Result<(), StoreError>;
}

/// Opens sessions against a durable store
pub trait StoreConnector: Send + Sync {
    fn describe(&self) -> String;

    fn connect(&self) -> Result<Box<dyn ReviewSession>, StoreError>;
}

/// Commits batches with insert-or-skip semantics.
///
/// The uniqueness constraint on the identity hash is the only guard against
/// concurrent runs; there is no read-then-write check.
#[derive(Clone)]
pub struct PersistenceCoordinator {
    connector: Arc<dyn StoreConnector>,
}

impl PersistenceCoordinator {
    pub fn new(connector: Arc<dyn StoreConnector>) -> Self {
        Self { connector }
    }

    pub fn describe(&self) -> String {
        self.connector.describe()
    }

    /// Commit every not-yet-stored review in the batch.
    ///
    /// Never fails: connection problems and bad records are reported through
    /// the returned counts, which always add up to the batch size.
    pub fn commit(&self, batch: &Batch) -> PersistenceOutcome {
        if batch.is_empty() {
            warn!("No reviews to save to the database");
            return PersistenceOutcome::default();
        }

        let mut session = match self.connector.connect() {
            Ok(session) => session,
            Err(e) => {
                error!(store = %self.connector.describe(), "Could not connect to review store: {}", e);
                return PersistenceOutcome::all_errored(batch.len());
            }
        };
        debug!(store = %self.connector.describe(), "Connected to review store");

        let outcome = Self::commit_with(session.as_mut(), batch);

        drop(session);
        debug!("Review store session closed");
        outcome
    }

    fn commit_with(session: &mut dyn ReviewSession, batch: &Batch) -> PersistenceOutcome {
        let mut tally = CommitTally::new(batch.len());

        if let Err(e) = session.begin() {
            error!("Failed to start transaction: {}", e);
            tally.fail_remaining(e.category());
            tally.log_summary("Review save");
            return tally.outcome();
        }

        let mut inserted_here: HashSet<&str> = HashSet::new();
        for review in batch {
            match session.insert_or_skip(review) {
                Ok(InsertOutcome::Inserted) => {
                    inserted_here.insert(review.identity_hash.as_str());
                    tally.record_inserted();
                }
                Ok(InsertOutcome::Duplicate) if inserted_here.contains(review.identity_hash.as_str()) => {
                    debug!(review_hash = %review.identity_hash, "Review repeated within the batch");
                    tally.record_pending_duplicate();
                }
                Ok(InsertOutcome::Duplicate) => {
                    debug!(review_hash = %review.identity_hash, "Review already stored");
                    tally.record_duplicate();
                }
                Err(e) => {
                    warn!(
                        review_hash = %review.identity_hash,
                        author = %review.author,
                        "Failed to save review: {}",
                        e
                    );
                    tally.record_errored(e.category());
                }
            }
        }

        if let Err(e) = session.commit() {
            error!("Failed to commit reviews: {}", e);
            tally.revoke_inserted(e.category());
        }

        tally.log_summary("Review save");
        let outcome = tally.outcome();
        info!(
            inserted = outcome.inserted,
            duplicate = outcome.duplicate,
            errored = outcome.errored,
            "Saved to database"
        );
        outcome
    }
}
