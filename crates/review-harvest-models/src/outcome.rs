use serde::{Deserialize, Serialize};

/// Result of one persistence attempt.
///
/// The three counts always partition the batch that was committed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistenceOutcome {
    pub inserted: usize,
    pub duplicate: usize,
    pub errored: usize,
}

impl PersistenceOutcome {
    /// Outcome for a batch that never reached the store
    pub fn all_errored(batch_len: usize) -> Self {
        Self {
            inserted: 0,
            duplicate: 0,
            errored: batch_len,
        }
    }

    pub fn total(&self) -> usize {
        self.inserted + self.duplicate + self.errored
    }

    pub fn is_clean(&self) -> bool {
        self.errored == 0
    }
}
