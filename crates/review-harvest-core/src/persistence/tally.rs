use review_harvest_models::PersistenceOutcome;
use std::collections::HashMap;
use tracing::{info, warn};

/// Running inserted/duplicate/errored counts for one commit.
///
/// Every record is counted exactly once, so the final outcome always
/// partitions the batch.
pub struct CommitTally {
    total: usize,
    inserted: usize,
    duplicate: usize,
    /// Duplicates of a record inserted earlier in this same commit
    pending_duplicate: usize,
    errored: usize,
    start_time: std::time::Instant,
    error_counts: HashMap<String, usize>, // Track errors by category
}

impl CommitTally {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            inserted: 0,
            duplicate: 0,
            pending_duplicate: 0,
            errored: 0,
            start_time: std::time::Instant::now(),
            error_counts: HashMap::new(),
        }
    }

    pub fn record_inserted(&mut self) {
        self.inserted += 1;
    }

    pub fn record_duplicate(&mut self) {
        self.duplicate += 1;
    }

    /// A duplicate whose original is only stored if this commit succeeds
    pub fn record_pending_duplicate(&mut self) {
        self.duplicate += 1;
        self.pending_duplicate += 1;
    }

    pub fn record_errored(&mut self, error_category: &str) {
        self.errored += 1;
        *self.error_counts.entry(error_category.to_string()).or_insert(0) += 1;
    }

    /// Inserts that never became durable (the enclosing commit failed)
    /// move to `errored`, along with duplicates of those inserts.
    pub fn revoke_inserted(&mut self, error_category: &str) {
        let revoked = self.inserted + self.pending_duplicate;
        self.duplicate -= self.pending_duplicate;
        self.inserted = 0;
        self.pending_duplicate = 0;
        self.errored += revoked;
        if revoked > 0 {
            *self.error_counts.entry(error_category.to_string()).or_insert(0) += revoked;
        }
    }

    /// Records not yet counted; used when the session dies mid-batch
    pub fn fail_remaining(&mut self, error_category: &str) {
        let counted = self.inserted + self.duplicate + self.errored;
        let remaining = self.total.saturating_sub(counted);
        for _ in 0..remaining {
            self.record_errored(error_category);
        }
    }

    pub fn outcome(&self) -> PersistenceOutcome {
        PersistenceOutcome {
            inserted: self.inserted,
            duplicate: self.duplicate,
            errored: self.errored,
        }
    }

    pub fn log_summary(&self, operation_name: &str) {
        let elapsed = self.start_time.elapsed();
        if self.errored > 0 {
            warn!(
                "{} completed: {} total in {:.1}s | New: {} | Duplicates: {} | Errors: {}",
                operation_name, self.total, elapsed.as_secs_f64(),
                self.inserted, self.duplicate, self.errored
            );

            let mut error_entries: Vec<_> = self.error_counts.iter().collect();
            error_entries.sort_by(|a, b| b.1.cmp(a.1));
            let error_summary: Vec<String> = error_entries
                .iter()
                .map(|(category, count)| format!("{}: {}", category, count))
                .collect();
            info!("Error breakdown: {}", error_summary.join(", "));
        } else {
            info!(
                "{} completed: {} total in {:.1}s | New: {} | Duplicates: {}",
                operation_name, self.total, elapsed.as_secs_f64(),
                self.inserted, self.duplicate
            );
        }
    }
}
