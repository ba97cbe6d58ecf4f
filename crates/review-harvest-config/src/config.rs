use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::selectors::SelectorRules;

/// Organization page scraped when no URL is configured
pub const DEFAULT_URL: &str = "https://www.vl.ru/vgues-vladivostoxkij-gosudarstvennyj-universitet";

/// Scroll-triggered lazy loading must fire at least this many times before the page is read
pub const MIN_SCROLL_PASSES: u32 = 2;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub website: WebsiteConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub selectors: SelectorRules,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebsiteConfig {
    #[serde(default = "default_url")]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default = "default_window_size")]
    pub window_size: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Explicit browser binary; system lookup and download are skipped when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrome_executable: Option<PathBuf>,
    #[serde(default = "default_content_timeout_secs")]
    pub content_timeout_secs: u64,
    #[serde(default = "default_scroll_passes")]
    pub scroll_passes: u32,
    #[serde(default = "default_scroll_pause_ms")]
    pub scroll_pause_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    #[serde(default = "default_max_reviews")]
    pub max_reviews: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_window_size() -> String {
    "1920,1080".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_content_timeout_secs() -> u64 {
    20
}

fn default_scroll_passes() -> u32 {
    3
}

fn default_scroll_pause_ms() -> u64 {
    2000
}

fn default_max_reviews() -> usize {
    10
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/output")
}

fn default_file_prefix() -> String {
    "reviews".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("data/reviews.db")
}

impl Default for WebsiteConfig {
    fn default() -> Self {
        Self { url: default_url() }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_true(),
            window_size: default_window_size(),
            user_agent: default_user_agent(),
            chrome_executable: None,
            content_timeout_secs: default_content_timeout_secs(),
            scroll_passes: default_scroll_passes(),
            scroll_pause_ms: default_scroll_pause_ms(),
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_reviews: default_max_reviews(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            directory: default_output_dir(),
            file_prefix: default_file_prefix(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_database_path(),
        }
    }
}

impl BrowserConfig {
    /// Parse `window_size` ("width,height")
    pub fn window_dimensions(&self) -> anyhow::Result<(u32, u32)> {
        let (w, h) = self
            .window_size
            .split_once(',')
            .ok_or_else(|| anyhow::anyhow!("window_size must look like \"1920,1080\", got {:?}", self.window_size))?;
        let width = w.trim().parse::<u32>()
            .map_err(|e| anyhow::anyhow!("Invalid window width {:?}: {}", w, e))?;
        let height = h.trim().parse::<u32>()
            .map_err(|e| anyhow::anyhow!("Invalid window height {:?}: {}", h, e))?;
        Ok((width, height))
    }

    /// Scroll passes actually performed; never fewer than the lazy-loading minimum
    pub fn effective_scroll_passes(&self) -> u32 {
        self.scroll_passes.max(MIN_SCROLL_PASSES)
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Load the file if it exists. `Ok(None)` means there is no file and the
    /// caller should fall back to defaults.
    pub fn load_optional(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from_file(path).map(Some)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.website.url.trim().is_empty() {
            return Err(anyhow::anyhow!("website.url cannot be empty"));
        }

        if self.parser.max_reviews == 0 {
            return Err(anyhow::anyhow!("parser.max_reviews must be at least 1"));
        }

        self.browser.window_dimensions()?;

        if self.selectors.containers.iter().all(|c| c.trim().is_empty()) {
            return Err(anyhow::anyhow!("selectors.containers needs at least one container selector"));
        }

        if self.output.enabled && self.output.file_prefix.trim().is_empty() {
            return Err(anyhow::anyhow!("output.file_prefix cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.website.url = "https://example.org/reviews".to_string();
        config.parser.max_reviews = 25;
        config.browser.chrome_executable = Some(PathBuf::from("/usr/bin/chromium"));

        config.save_to_file(file.path()).unwrap();

        let loaded = Config::load_from_file(file.path()).unwrap();
        assert_eq!(loaded.website.url, "https://example.org/reviews");
        assert_eq!(loaded.parser.max_reviews, 25);
        assert_eq!(loaded.browser.chrome_executable, Some(PathBuf::from("/usr/bin/chromium")));
        assert_eq!(loaded.selectors, SelectorRules::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [parser]
            max_reviews = 3

            [database]
            path = "/tmp/r.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.parser.max_reviews, 3);
        assert_eq!(config.database.path, PathBuf::from("/tmp/r.db"));
        assert!(config.database.enabled);
        assert_eq!(config.website.url, DEFAULT_URL);
        assert_eq!(config.browser.content_timeout_secs, 20);
        assert_eq!(config.output.directory, PathBuf::from("data/output"));
    }

    #[test]
    fn test_load_optional_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::load_optional(&missing).unwrap().is_none());
    }

    #[test]
    fn test_load_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[parser\nmax_reviews = ").unwrap();
        assert!(Config::load_optional(&path).is_err());
    }

    #[test]
    fn test_config_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.parser.max_reviews = 0;
        assert!(config.validate().is_err());
        config.parser.max_reviews = 10;

        config.browser.window_size = "wide".to_string();
        assert!(config.validate().is_err());
        config.browser.window_size = "1280, 720".to_string();
        assert_eq!(config.browser.window_dimensions().unwrap(), (1280, 720));

        config.selectors.containers.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_scroll_passes_floor() {
        let mut browser = BrowserConfig::default();
        browser.scroll_passes = 0;
        assert_eq!(browser.effective_scroll_passes(), MIN_SCROLL_PASSES);
        browser.scroll_passes = 5;
        assert_eq!(browser.effective_scroll_passes(), 5);
    }
}
