use std::time::Duration;
use thiserror::Error;

/// Failures of the page renderer. Any of these ends the run: nothing is
/// extracted from a page that did not finish rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("review content did not appear at {url} within {waited:?}")]
    Timeout { url: String, waited: Duration },

    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("failed to load {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("failed to read page source: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RenderError::Timeout { .. })
    }
}
