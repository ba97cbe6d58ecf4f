use review_harvest_models::Review;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use crate::error::StoreError;
use super::{InsertOutcome, ReviewSession, StoreConnector};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY,
    author TEXT NOT NULL,
    review_date TEXT NULL,
    rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    content TEXT NOT NULL,
    review_hash TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);";

const INSERT_REVIEW: &str = "
INSERT INTO reviews (author, review_date, rating, content, review_hash)
VALUES (?1, ?2, ?3, ?4, ?5)
ON CONFLICT(review_hash) DO NOTHING";

/// SQLite database file holding the `reviews` table
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    path: PathBuf,
}

impl SqliteConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<Connection, StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Unavailable(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open(&self.path)
            .map_err(|e| StoreError::Unavailable(format!("cannot open {}: {}", self.path.display(), e)))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::Unavailable(format!("cannot prepare schema: {}", e)))?;
        Ok(conn)
    }

    /// Number of stored reviews
    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.open()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0))
            .map_err(classify)?;
        Ok(count as usize)
    }

    pub fn contains(&self, review_hash: &str) -> Result<bool, StoreError> {
        let conn = self.open()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT id FROM reviews WHERE review_hash = ?1",
                params![review_hash],
                |row| row.get(0),
            )
            .optional()
            .map_err(classify)?;
        Ok(found.is_some())
    }
}

impl StoreConnector for SqliteConnector {
    fn describe(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }

    fn connect(&self) -> Result<Box<dyn ReviewSession>, StoreError> {
        let conn = self.open()?;
        Ok(Box::new(SqliteSession { conn }))
    }
}

/// One outer transaction; every insert runs inside its own savepoint so a
/// rejected record is rolled back alone.
struct SqliteSession {
    conn: Connection,
}

impl SqliteSession {
    fn insert(&self, review: &Review) -> Result<InsertOutcome, StoreError> {
        let review_date = review.published_at.map(|d| d.format("%Y-%m-%d").to_string());
        let changed = self
            .conn
            .execute(
                INSERT_REVIEW,
                params![
                    review.author,
                    review_date,
                    review.rating,
                    review.text,
                    review.identity_hash,
                ],
            )
            .map_err(classify)?;

        Ok(if changed == 0 {
            InsertOutcome::Duplicate
        } else {
            InsertOutcome::Inserted
        })
    }
}

impl SqliteSession {
    /// Release the savepoint on success. Any failure, including the release
    /// itself, rolls the record back so nothing of it reaches the commit.
    fn close_savepoint(
        &self,
        result: Result<InsertOutcome, StoreError>,
    ) -> Result<InsertOutcome, StoreError> {
        let result = result.and_then(|outcome| {
            self.conn
                .execute_batch("RELEASE review_insert")
                .map_err(classify)?;
            Ok(outcome)
        });

        if result.is_err() {
            if let Err(rollback) = self
                .conn
                .execute_batch("ROLLBACK TO review_insert; RELEASE review_insert")
            {
                warn!("Failed to roll back savepoint: {}", rollback);
            }
        }
        result
    }
}

impl ReviewSession for SqliteSession {
    fn begin(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("BEGIN").map_err(classify)
    }

    fn insert_or_skip(&mut self, review: &Review) -> Result<InsertOutcome, StoreError> {
        self.conn
            .execute_batch("SAVEPOINT review_insert")
            .map_err(classify)?;

        let result = self.insert(review);
        self.close_savepoint(result)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| StoreError::Commit(e.to_string()))
    }
}

impl Drop for SqliteSession {
    fn drop(&mut self) {
        if !self.conn.is_autocommit() {
            debug!("Rolling back unfinished review transaction");
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}

fn classify(e: rusqlite::Error) -> StoreError {
    match e.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => StoreError::Constraint(e.to_string()),
        Some(ErrorCode::CannotOpen) | Some(ErrorCode::NotADatabase) => StoreError::Unavailable(e.to_string()),
        _ => StoreError::Database(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::PersistenceCoordinator;
    use chrono::NaiveDate;
    use review_harvest_models::{Batch, PersistenceOutcome};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn review(author: &str, rating: u8, hash: &str) -> Review {
        Review {
            author: author.to_string(),
            published_at: NaiveDate::from_ymd_opt(2023, 11, 14),
            rating,
            text: format!("{} says hi", author),
            identity_hash: hash.to_string(),
        }
    }

    fn setup() -> (TempDir, SqliteConnector, PersistenceCoordinator) {
        let dir = TempDir::new().unwrap();
        let connector = SqliteConnector::new(dir.path().join("nested/reviews.db"));
        let coordinator = PersistenceCoordinator::new(Arc::new(connector.clone()));
        (dir, connector, coordinator)
    }

    #[test]
    fn test_rerun_inserts_nothing_new() {
        let (_dir, connector, coordinator) = setup();
        let batch = Batch::new(vec![review("a", 5, "h1"), review("b", 1, "h2"), review("c", 3, "h3")]);

        let first = coordinator.commit(&batch);
        assert_eq!(first, PersistenceOutcome { inserted: 3, duplicate: 0, errored: 0 });

        let second = coordinator.commit(&batch);
        assert_eq!(second, PersistenceOutcome { inserted: 0, duplicate: 3, errored: 0 });
        assert_eq!(connector.count().unwrap(), 3);
    }

    #[test]
    fn test_rejected_record_is_isolated() {
        let (_dir, connector, coordinator) = setup();
        let batch = Batch::new(vec![
            review("a", 4, "h1"),
            review("bad", 9, "h2"),
            review("c", 2, "h3"),
        ]);

        let outcome = coordinator.commit(&batch);
        assert_eq!(outcome, PersistenceOutcome { inserted: 2, duplicate: 0, errored: 1 });
        assert_eq!(outcome.total(), batch.len());

        assert!(connector.contains("h1").unwrap());
        assert!(!connector.contains("h2").unwrap());
        assert!(connector.contains("h3").unwrap());
    }

    #[test]
    fn test_existing_rows_are_not_modified() {
        let (_dir, connector, coordinator) = setup();
        coordinator.commit(&Batch::new(vec![review("a", 4, "h1")]));

        // Same hash, different payload: the stored row wins
        let mut changed = review("a", 1, "h1");
        changed.text = "edited".to_string();
        let outcome = coordinator.commit(&Batch::new(vec![changed, review("b", 2, "h2")]));
        assert_eq!(outcome, PersistenceOutcome { inserted: 1, duplicate: 1, errored: 0 });

        let conn = Connection::open(connector.path()).unwrap();
        let (rating, content): (u8, String) = conn
            .query_row(
                "SELECT rating, content FROM reviews WHERE review_hash = 'h1'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(rating, 4);
        assert_eq!(content, "a says hi");
    }

    #[test]
    fn test_failure_after_insert_discards_the_row() {
        let (_dir, connector, _coordinator) = setup();
        let mut session = SqliteSession { conn: connector.open().unwrap() };
        session.begin().unwrap();

        session.conn.execute_batch("SAVEPOINT review_insert").unwrap();
        assert_eq!(session.insert(&review("a", 4, "h1")).unwrap(), InsertOutcome::Inserted);
        let closed = session.close_savepoint(Err(StoreError::Database("release failed".to_string())));
        assert!(closed.is_err());

        assert_eq!(session.insert_or_skip(&review("b", 2, "h2")).unwrap(), InsertOutcome::Inserted);
        session.commit().unwrap();

        assert!(!connector.contains("h1").unwrap());
        assert!(connector.contains("h2").unwrap());
    }

    #[test]
    fn test_missing_date_stored_as_null() {
        let (_dir, connector, coordinator) = setup();
        let mut undated = review("a", 3, "h1");
        undated.published_at = None;
        coordinator.commit(&Batch::new(vec![undated]));

        let conn = Connection::open(connector.path()).unwrap();
        let date: Option<String> = conn
            .query_row("SELECT review_date FROM reviews", [], |row| row.get(0))
            .unwrap();
        assert_eq!(date, None);
    }

    #[test]
    fn test_unusable_path_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "plain file").unwrap();

        let connector = SqliteConnector::new(blocker.join("reviews.db"));
        match connector.connect() {
            Err(StoreError::Unavailable(_)) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
            Ok(_) => panic!("connect should fail"),
        }

        let coordinator = PersistenceCoordinator::new(Arc::new(connector));
        let outcome = coordinator.commit(&Batch::new(vec![review("a", 1, "h1"), review("b", 1, "h2")]));
        assert_eq!(outcome, PersistenceOutcome::all_errored(2));
    }

    #[test]
    fn test_uncommitted_session_rolls_back() {
        let (_dir, connector, _) = setup();
        {
            let mut session = connector.connect().unwrap();
            session.begin().unwrap();
            assert_eq!(
                session.insert_or_skip(&review("a", 3, "h1")).unwrap(),
                InsertOutcome::Inserted
            );
        }
        assert_eq!(connector.count().unwrap(), 0);
    }
}
