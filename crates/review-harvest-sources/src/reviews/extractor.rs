use review_harvest_config::SelectorRules;
use scraper::{ElementRef, Html};
use tracing::{debug, info};
use super::rules::{first_hit, first_present, CompiledRules};

/// One review's markup region inside a parsed page.
///
/// Only lives as long as the parsed document and never leaves the extraction step.
pub struct RawFragment<'a> {
    element: ElementRef<'a>,
    position: usize,
}

impl<'a> RawFragment<'a> {
    /// Zero-based position of the fragment in document order
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Field values pulled from a fragment, untouched apart from trimming.
/// The timestamp is kept verbatim since it feeds the identity hash.
/// `None` means no rule located the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawReview {
    pub author: Option<String>,
    pub timestamp: Option<String>,
    pub rating: Option<String>,
    pub text: Option<String>,
}

/// Fragments chosen from one page
pub struct FragmentSelection<'a> {
    pub fragments: Vec<RawFragment<'a>>,
    /// How many containers matched before the cap was applied
    pub found: usize,
    /// Container selector that produced the fragments
    pub convention: Option<String>,
}

impl<'a> FragmentSelection<'a> {
    fn empty() -> Self {
        Self {
            fragments: Vec::new(),
            found: 0,
            convention: None,
        }
    }
}

pub struct Extractor {
    rules: CompiledRules,
    max_reviews: usize,
}

impl Extractor {
    pub fn new(rules: &SelectorRules, max_reviews: usize) -> Self {
        Self {
            rules: CompiledRules::compile(rules),
            max_reviews,
        }
    }

    pub fn max_reviews(&self) -> usize {
        self.max_reviews
    }

    /// Group selector matching any usable container convention, for waiting
    /// on rendered content. `None` when no container rule survived compilation.
    pub fn wait_selector(&self) -> Option<String> {
        if self.rules.containers.is_empty() {
            return None;
        }
        let parts: Vec<&str> = self.rules.containers.iter().map(|(css, _)| css.as_str()).collect();
        Some(parts.join(", "))
    }

    /// Pick review containers from the page.
    ///
    /// Conventions are tried in priority order and the first one that matches
    /// anything is used for the whole page. Results keep document order and are
    /// cut to `max_reviews` from the tail.
    pub fn select_fragments<'a>(&self, document: &'a Html) -> FragmentSelection<'a> {
        for (css, selector) in &self.rules.containers {
            let matched: Vec<ElementRef<'a>> = document.select(selector).collect();
            if matched.is_empty() {
                debug!(convention = %css, "No review containers under this convention");
                continue;
            }

            let found = matched.len();
            let fragments: Vec<RawFragment<'a>> = matched
                .into_iter()
                .take(self.max_reviews)
                .enumerate()
                .map(|(position, element)| RawFragment { element, position })
                .collect();

            info!(
                convention = %css,
                found,
                kept = fragments.len(),
                "Found review blocks"
            );

            return FragmentSelection {
                fragments,
                found,
                convention: Some(css.clone()),
            };
        }

        FragmentSelection::empty()
    }

    /// Read every field independently; a missing field never affects the others
    pub fn read_fields(&self, fragment: &RawFragment<'_>) -> RawReview {
        let root = fragment.element;
        RawReview {
            author: first_hit(&self.rules.author, root),
            timestamp: first_present(&self.rules.timestamp, root),
            rating: first_hit(&self.rules.rating, root),
            text: first_hit(&self.rules.text, root),
        }
    }
}

#[cfg(test)]
mod tests;
