use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Author used when a review carries no display name
pub const ANONYMOUS_AUTHOR: &str = "anonymous";

/// Canonical review record.
///
/// Two reviews with the same `identity_hash` are the same review, whatever the
/// other fields say. Persistence and dedup key on the hash alone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Review {
    pub author: String,
    pub published_at: Option<NaiveDate>, // UTC calendar date, time-of-day dropped
    pub rating: u8,                      // 1-5
    pub text: String,
    pub identity_hash: String, // hex SHA-256 over author + raw timestamp + text
}

impl Review {
    /// Date rendered as `YYYY-MM-DD`, empty when unknown
    pub fn date_string(&self) -> String {
        self.published_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

/// Fields a review fragment can provide
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ReviewField {
    Author,
    Timestamp,
    Rating,
    Text,
}

impl ReviewField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewField::Author => "author",
            ReviewField::Timestamp => "timestamp",
            ReviewField::Rating => "rating",
            ReviewField::Text => "text",
        }
    }
}

impl std::fmt::Display for ReviewField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
