use serde::{Deserialize, Serialize};

/// One way of locating a field inside a review fragment.
///
/// `selector = None` targets the fragment root itself; `attr = None` reads the
/// element's text content instead of an attribute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr: Option<String>,
}

impl FieldRule {
    /// Text content of the first descendant matching `selector`
    pub fn text(selector: &str) -> Self {
        Self {
            selector: Some(selector.to_string()),
            attr: None,
        }
    }

    /// Attribute on the fragment root
    pub fn root_attr(attr: &str) -> Self {
        Self {
            selector: None,
            attr: Some(attr.to_string()),
        }
    }

    /// Attribute on the first descendant matching `selector`
    pub fn attr(selector: &str, attr: &str) -> Self {
        Self {
            selector: Some(selector.to_string()),
            attr: Some(attr.to_string()),
        }
    }
}

/// Ordered extraction strategies for one site layout family.
///
/// Every list is tried front to back. Adding support for a new markup variant
/// means appending a rule, not writing code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectorRules {
    /// Review container conventions. The first one that matches anything on the
    /// page wins for the whole page.
    #[serde(default = "default_containers")]
    pub containers: Vec<String>,
    #[serde(default = "default_author_rules")]
    pub author: Vec<FieldRule>,
    #[serde(default = "default_timestamp_rules")]
    pub timestamp: Vec<FieldRule>,
    #[serde(default = "default_rating_rules")]
    pub rating: Vec<FieldRule>,
    #[serde(default = "default_text_rules")]
    pub text: Vec<FieldRule>,
}

fn default_containers() -> Vec<String> {
    vec![
        r#"li[data-type="review"]"#.to_string(),
        "div.comments-list li.comment".to_string(),
    ]
}

fn default_author_rules() -> Vec<FieldRule> {
    vec![
        FieldRule::text("span.user-name"),
        FieldRule::text(".cmt-user-name span"),
    ]
}

fn default_timestamp_rules() -> Vec<FieldRule> {
    vec![
        FieldRule::root_attr("data-timestamp"),
        FieldRule::attr("[data-timestamp]", "data-timestamp"),
    ]
}

fn default_rating_rules() -> Vec<FieldRule> {
    vec![
        FieldRule::root_attr("user-rating"),
        FieldRule::attr("[user-rating]", "user-rating"),
        FieldRule::root_attr("data-rating"),
    ]
}

fn default_text_rules() -> Vec<FieldRule> {
    vec![
        FieldRule::text("p.comment-text"),
        FieldRule::text(".comment-text"),
    ]
}

impl Default for SelectorRules {
    fn default() -> Self {
        Self {
            containers: default_containers(),
            author: default_author_rules(),
            timestamp: default_timestamp_rules(),
            rating: default_rating_rules(),
            text: default_text_rules(),
        }
    }
}
