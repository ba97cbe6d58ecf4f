use serde::{Deserialize, Serialize};
use crate::review::Review;

/// Ordered reviews produced by one pipeline run.
///
/// Downstream consumers only ever get a shared view; nothing mutates a batch
/// once the normalizer hands it over.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Batch {
    reviews: Vec<Review>,
}

impl Batch {
    pub fn new(reviews: Vec<Review>) -> Self {
        Self { reviews }
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Review> {
        self.reviews.iter()
    }

    pub fn as_slice(&self) -> &[Review] {
        &self.reviews
    }
}

impl From<Vec<Review>> for Batch {
    fn from(reviews: Vec<Review>) -> Self {
        Self::new(reviews)
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a Review;
    type IntoIter = std::slice::Iter<'a, Review>;

    fn into_iter(self) -> Self::IntoIter {
        self.reviews.iter()
    }
}
