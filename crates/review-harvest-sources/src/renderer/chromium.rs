use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use chromiumoxide::{Browser, BrowserConfig as ChromeConfig, Page};
use futures::StreamExt;
use review_harvest_config::{BrowserConfig, PathManager};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};
use which::which;
use crate::error::RenderError;
use crate::traits::PageRenderer;

const SCROLL_TO_BOTTOM_JS: &str = "window.scrollTo(0, document.body.scrollHeight);";
const CONTENT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Headless Chromium renderer.
///
/// The browser is launched lazily on the first `render` call and torn down in
/// `shutdown`, so constructing one is cheap.
pub struct ChromiumRenderer {
    browser: Option<Browser>,
    handler_task: Option<tokio::task::JoinHandle<()>>,
    settings: BrowserConfig,
    wait_selector: String,
    download_dir: PathBuf,
}

impl ChromiumRenderer {
    /// `wait_selector` is the CSS selector whose presence means the review list has rendered
    pub fn new(settings: BrowserConfig, wait_selector: impl Into<String>, paths: &PathManager) -> Self {
        Self {
            browser: None,
            handler_task: None,
            settings,
            wait_selector: wait_selector.into(),
            download_dir: paths.browser_download_dir(),
        }
    }

    async fn ensure_browser_initialized(&mut self) -> Result<(), RenderError> {
        if self.browser.is_some() {
            return Ok(());
        }

        info!("Browser not initialized, launching");
        let (browser, handler_task) = Self::launch(&self.settings, &self.download_dir)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        self.browser = Some(browser);
        self.handler_task = Some(handler_task);
        info!("Browser launched");
        Ok(())
    }

    async fn launch(
        settings: &BrowserConfig,
        download_dir: &Path,
    ) -> Result<(Browser, tokio::task::JoinHandle<()>)> {
        let mut chrome_path = settings
            .chrome_executable
            .clone()
            .or_else(Self::find_system_chromium);

        if chrome_path.is_none() {
            info!("No system Chromium found, downloading via BrowserFetcher...");
            tokio::fs::create_dir_all(download_dir).await?;

            let fetcher = BrowserFetcher::new(
                BrowserFetcherOptions::builder()
                    .with_path(download_dir)
                    .build()
                    .map_err(|e| anyhow!("Failed to create BrowserFetcherOptions: {}", e))?,
            );

            let fetched = fetcher.fetch().await
                .map_err(|e| anyhow!("Failed to fetch Chromium: {}", e))?;
            info!("Chromium downloaded to: {:?}", fetched.executable_path);
            chrome_path = Some(fetched.executable_path);
        }

        let config = Self::build_browser_config(chrome_path, settings)?;

        let (browser, mut handler) = Browser::launch(config).await
            .map_err(|e| anyhow!("Failed to launch browser: {}", e))?;

        let handler_task = tokio::spawn(async move {
            let mut error_count = 0;
            const MAX_ERRORS: usize = 10;

            while let Some(h) = handler.next().await {
                match h {
                    Ok(_) => {
                        error_count = 0;
                    }
                    Err(e) => {
                        error_count += 1;
                        warn!(
                            "Browser handler error (count: {}/{}): {:?}",
                            error_count, MAX_ERRORS, e
                        );

                        if error_count >= MAX_ERRORS {
                            error!(
                                "Browser handler received {} consecutive errors. Browser process may have crashed.",
                                error_count
                            );
                            break;
                        }
                    }
                }
            }

            if error_count > 0 {
                error!("Browser handler task ended after {} errors. Browser may have crashed.", error_count);
            } else {
                debug!("Browser handler task ended normally");
            }
        });

        Ok((browser, handler_task))
    }

    /// Check if we're running in Docker
    fn is_docker() -> bool {
        Path::new("/.dockerenv").exists()
            || std::fs::read_to_string("/proc/self/cgroup")
                .ok()
                .map(|s| s.contains("docker") || s.contains("containerd"))
                .unwrap_or(false)
    }

    fn find_system_chromium() -> Option<PathBuf> {
        let candidates: &[&str] = if cfg!(target_os = "macos") {
            &[
                "/Applications/Chromium.app/Contents/MacOS/Chromium",
                "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
                "/opt/homebrew/bin/chromium",
                "/usr/local/bin/chromium",
            ]
        } else {
            &[
                "/usr/bin/chromium",
                "/usr/bin/chromium-browser",
                "/usr/bin/google-chrome",
                "/usr/local/bin/chromium",
                "/opt/chromium/chromium",
            ]
        };

        for path in candidates {
            if Path::new(path).exists() {
                return Some(PathBuf::from(path));
            }
        }

        which("chromium")
            .or_else(|_| which("chromium-browser"))
            .or_else(|_| which("google-chrome"))
            .ok()
    }

    fn build_browser_config(chrome_path: Option<PathBuf>, settings: &BrowserConfig) -> Result<ChromeConfig> {
        let (width, height) = settings.window_dimensions()?;
        let mut builder = ChromeConfig::builder().window_size(width, height);

        if let Some(path) = chrome_path {
            builder = builder.chrome_executable(path);
        }

        // chromiumoxide launches headless unless told otherwise
        if !settings.headless && !Self::is_docker() {
            builder = builder.with_head();
        }

        if Self::is_docker() || !cfg!(target_os = "macos") {
            builder = builder
                .arg("--no-sandbox")
                .arg("--disable-dev-shm-usage");
        }

        builder = builder
            .arg("--disable-gpu")
            .arg("--disable-extensions")
            .arg("--disable-notifications")
            .arg("--disable-sync")
            .arg("--disable-default-apps")
            .arg("--disable-background-timer-throttling")
            .arg("--disable-renderer-backgrounding")
            .arg("--log-level=3")
            .arg(format!("--user-agent={}", settings.user_agent));

        builder.build()
            .map_err(|e| anyhow!("Failed to build browser config: {}", e))
    }

    /// Poll until the review container selector matches or the deadline passes
    async fn wait_for_content(&self, page: &Page, url: &str, deadline: Instant) -> Result<(), RenderError> {
        loop {
            if page.find_element(self.wait_selector.as_str()).await.is_ok() {
                debug!(selector = %self.wait_selector, "Review content present");
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(self.timeout(url));
            }
            sleep(CONTENT_POLL_INTERVAL).await;
        }
    }

    /// Scroll to the bottom repeatedly so lazily loaded reviews get fetched
    async fn trigger_lazy_loading(&self, page: &Page) -> Result<(), RenderError> {
        let passes = self.settings.effective_scroll_passes();
        let pause = Duration::from_millis(self.settings.scroll_pause_ms);
        info!(passes, "Scrolling to load dynamic content");

        for pass in 1..=passes {
            page.evaluate(SCROLL_TO_BOTTOM_JS).await
                .map_err(|e| RenderError::Browser(format!("scroll pass {} failed: {}", pass, e)))?;
            sleep(pause).await;
        }
        Ok(())
    }

    fn timeout(&self, url: &str) -> RenderError {
        RenderError::Timeout {
            url: url.to_string(),
            waited: Duration::from_secs(self.settings.content_timeout_secs),
        }
    }

    async fn render_page(&self, page: &Page, url: &str, deadline: Instant) -> Result<String, RenderError> {
        self.wait_for_content(page, url, deadline).await?;
        info!("Main page content loaded");

        self.trigger_lazy_loading(page).await?;

        page.content().await
            .map_err(|e| RenderError::Browser(format!("failed to read page content: {}", e)))
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    fn renderer_name(&self) -> &str {
        "chromium"
    }

    async fn render(&mut self, url: &str) -> Result<String, RenderError> {
        self.ensure_browser_initialized().await?;
        let browser = self.browser.as_ref()
            .ok_or_else(|| RenderError::Browser("browser not initialized".to_string()))?;

        info!(url = %url, "Loading page");
        let deadline = Instant::now() + Duration::from_secs(self.settings.content_timeout_secs);

        let page = match tokio::time::timeout_at(deadline, browser.new_page(url)).await {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => {
                return Err(RenderError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })
            }
            Err(_) => return Err(self.timeout(url)),
        };

        let result = self.render_page(&page, url, deadline).await;

        if let Err(e) = page.close().await {
            debug!("Failed to close page: {}", e);
        }

        result
    }

    async fn shutdown(&mut self) -> Result<(), RenderError> {
        if let Some(mut browser) = self.browser.take() {
            info!("Shutting down browser instance");

            if let Err(e) = browser.close().await {
                warn!("Browser did not close cleanly: {}", e);
            }

            if let Some(handler_task) = self.handler_task.take() {
                let _ = tokio::time::timeout(Duration::from_secs(2), handler_task).await;
            }

            info!("Browser instance shut down");
        }
        Ok(())
    }
}
