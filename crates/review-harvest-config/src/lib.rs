pub mod config;
pub mod paths;
pub mod selectors;

pub use config::{BrowserConfig, Config, DatabaseConfig, LoggingConfig, OutputConfig, ParserConfig, WebsiteConfig, DEFAULT_URL, MIN_SCROLL_PASSES};
pub use paths::{PathManager, container_base_path};
pub use selectors::{FieldRule, SelectorRules};
