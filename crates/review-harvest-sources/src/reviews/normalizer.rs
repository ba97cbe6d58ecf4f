use chrono::{DateTime, NaiveDate};
use regex::Regex;
use review_harvest_models::{Review, ReviewField, ANONYMOUS_AUTHOR, MAX_RATING, MIN_RATING, SOURCE_RATING_SCALE};
use sha2::{Digest, Sha256};
use std::sync::LazyLock;
use super::extractor::RawReview;

/// Stands in for an absent timestamp in the identity hash input.
/// Hashes already stored were computed with this token, so it must not change.
pub const MISSING_TIMESTAMP_TOKEN: &str = "None";

/// Runs of three or more asterisks are censorship placeholders
static CENSORSHIP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*{3,}").unwrap());

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// A canonical review plus the fields that fell back to their defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub review: Review,
    pub defaulted: Vec<ReviewField>,
}

/// Turn raw fragment fields into exactly one canonical review
pub fn normalize(raw: &RawReview) -> Normalized {
    let mut defaulted = Vec::new();

    let author = match raw.author.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        Some(author) => author.to_string(),
        None => {
            defaulted.push(ReviewField::Author);
            ANONYMOUS_AUTHOR.to_string()
        }
    };

    // The hash takes the attribute as received, blank included
    let raw_timestamp = raw.timestamp.as_deref();
    let usable_timestamp = raw_timestamp.map(str::trim).filter(|t| !t.is_empty());
    if usable_timestamp.is_none() {
        defaulted.push(ReviewField::Timestamp);
    }
    let published_at = usable_timestamp.and_then(timestamp_to_date);

    let rating = match raw.rating.as_deref().and_then(parse_source_rating) {
        Some(value) => convert_rating(value),
        None => {
            defaulted.push(ReviewField::Rating);
            MIN_RATING
        }
    };

    let text = match raw.text.as_deref() {
        Some(text) => clean_text(text),
        None => {
            defaulted.push(ReviewField::Text);
            String::new()
        }
    };

    let identity_hash = identity_hash(&author, raw_timestamp, &text);

    Normalized {
        review: Review {
            author,
            published_at,
            rating,
            text,
            identity_hash,
        },
        defaulted,
    }
}

/// Remove censorship placeholders, then collapse whitespace and trim.
///
/// Placeholder removal runs first because it can leave neighbouring spaces
/// that the whitespace pass has to merge.
pub fn clean_text(text: &str) -> String {
    let uncensored = CENSORSHIP.replace_all(text, "");
    WHITESPACE_RUN.replace_all(&uncensored, " ").trim().to_string()
}

fn parse_source_rating(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}

/// Map a source rating in (0, 1] onto the 1-5 scale.
///
/// Halves round up (0.9 -> 4.5 -> 5). Zero, negatives and NaN are
/// indistinguishable from "no rating" at the source and land on the floor.
pub fn convert_rating(source: f64) -> u8 {
    if !(source > 0.0) {
        return MIN_RATING;
    }
    let scaled = (source * SOURCE_RATING_SCALE).round();
    scaled.clamp(MIN_RATING as f64, MAX_RATING as f64) as u8
}

/// Unix epoch seconds to a UTC calendar date
pub fn timestamp_to_date(raw: &str) -> Option<NaiveDate> {
    let seconds = raw.trim().parse::<i64>().ok()?;
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.date_naive())
}

/// Hex SHA-256 over author, raw timestamp and cleaned text, concatenated in that order
pub fn identity_hash(author: &str, raw_timestamp: Option<&str>, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(author.as_bytes());
    hasher.update(raw_timestamp.unwrap_or(MISSING_TIMESTAMP_TOKEN).as_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
