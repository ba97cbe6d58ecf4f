pub mod extractor;
pub mod normalizer;
mod rules;

pub use extractor::{Extractor, FragmentSelection, RawFragment, RawReview};
pub use normalizer::{clean_text, convert_rating, identity_hash, normalize, timestamp_to_date, Normalized, MISSING_TIMESTAMP_TOKEN};

use review_harvest_models::{Batch, ReviewField};
use scraper::Html;
use std::collections::HashMap;
use tracing::{debug, info};

/// Reviews produced from one page, plus what the extractor saw
#[derive(Debug, Clone, Default)]
pub struct Harvest {
    pub batch: Batch,
    /// Containers matched before the cap was applied
    pub fragments_found: usize,
    pub convention: Option<String>,
    /// How often each field fell back to its default
    pub defaulted: HashMap<ReviewField, usize>,
}

impl Harvest {
    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }
}

/// Parse rendered markup and normalize every selected fragment.
///
/// The parsed document is confined to this call, so nothing borrowed from it
/// can outlive extraction.
pub fn extract_reviews(markup: &str, extractor: &Extractor) -> Harvest {
    let document = Html::parse_document(markup);
    let selection = extractor.select_fragments(&document);

    let mut reviews = Vec::with_capacity(selection.fragments.len());
    let mut defaulted: HashMap<ReviewField, usize> = HashMap::new();

    for fragment in &selection.fragments {
        let raw = extractor.read_fields(fragment);
        let normalized = normalize(&raw);

        if !normalized.defaulted.is_empty() {
            debug!(
                position = fragment.position(),
                fields = ?normalized.defaulted,
                "Fields missing in review block, defaults applied"
            );
        }
        for field in &normalized.defaulted {
            *defaulted.entry(*field).or_insert(0) += 1;
        }

        debug!(
            position = fragment.position(),
            author = %normalized.review.author,
            date = %normalized.review.date_string(),
            "Review processed"
        );
        reviews.push(normalized.review);
    }

    if !reviews.is_empty() {
        info!(
            processed = reviews.len(),
            cap = extractor.max_reviews(),
            "Reviews normalized"
        );
    }

    Harvest {
        batch: Batch::new(reviews),
        fragments_found: selection.found,
        convention: selection.convention,
        defaulted,
    }
}
