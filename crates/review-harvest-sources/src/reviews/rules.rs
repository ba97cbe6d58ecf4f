use review_harvest_config::{FieldRule, SelectorRules};
use scraper::{ElementRef, Selector};
use tracing::warn;

/// A `FieldRule` with its CSS already parsed
#[derive(Debug)]
pub(crate) struct CompiledFieldRule {
    selector: Option<Selector>,
    attr: Option<String>,
}

impl CompiledFieldRule {
    fn compile(rule: &FieldRule, field: &str) -> Option<Self> {
        let selector = match rule.selector.as_deref() {
            Some(css) => Some(compile_selector(css, field)?),
            None => None,
        };
        Some(Self {
            selector,
            attr: rule.attr.clone(),
        })
    }

    /// Read the rule's value from a fragment; blank values count as a miss
    pub(crate) fn read(&self, root: ElementRef<'_>) -> Option<String> {
        let target = match &self.selector {
            Some(selector) => root.select(selector).next()?,
            None => root,
        };

        let value = match &self.attr {
            Some(attr) => target.value().attr(attr)?.trim().to_string(),
            None => target.text().collect::<String>().trim().to_string(),
        };

        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// Read the rule's value exactly as it appears in the markup.
    /// A present but empty attribute is `Some("")`.
    pub(crate) fn read_verbatim(&self, root: ElementRef<'_>) -> Option<String> {
        let target = match &self.selector {
            Some(selector) => root.select(selector).next()?,
            None => root,
        };

        match &self.attr {
            Some(attr) => target.value().attr(attr).map(str::to_string),
            None => Some(target.text().collect()),
        }
    }
}

/// Selector rules parsed once per run.
///
/// Rules with invalid CSS are dropped with a warning so one bad entry in the
/// config cannot stop extraction.
#[derive(Debug)]
pub(crate) struct CompiledRules {
    pub(crate) containers: Vec<(String, Selector)>,
    pub(crate) author: Vec<CompiledFieldRule>,
    pub(crate) timestamp: Vec<CompiledFieldRule>,
    pub(crate) rating: Vec<CompiledFieldRule>,
    pub(crate) text: Vec<CompiledFieldRule>,
}

impl CompiledRules {
    pub(crate) fn compile(rules: &SelectorRules) -> Self {
        let containers = rules
            .containers
            .iter()
            .filter(|css| !css.trim().is_empty())
            .filter_map(|css| compile_selector(css, "container").map(|s| (css.clone(), s)))
            .collect();

        Self {
            containers,
            author: compile_field(&rules.author, "author"),
            timestamp: compile_field(&rules.timestamp, "timestamp"),
            rating: compile_field(&rules.rating, "rating"),
            text: compile_field(&rules.text, "text"),
        }
    }
}

/// First rule that yields a value wins
pub(crate) fn first_hit(rules: &[CompiledFieldRule], root: ElementRef<'_>) -> Option<String> {
    rules.iter().find_map(|rule| rule.read(root))
}

/// First rule whose target exists wins, even when its value is blank
pub(crate) fn first_present(rules: &[CompiledFieldRule], root: ElementRef<'_>) -> Option<String> {
    rules.iter().find_map(|rule| rule.read_verbatim(root))
}

fn compile_field(rules: &[FieldRule], field: &str) -> Vec<CompiledFieldRule> {
    rules
        .iter()
        .filter_map(|rule| CompiledFieldRule::compile(rule, field))
        .collect()
}

fn compile_selector(css: &str, field: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!(field = field, selector = css, "Skipping invalid selector rule: {:?}", e);
            None
        }
    }
}
