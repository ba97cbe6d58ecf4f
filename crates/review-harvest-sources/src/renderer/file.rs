use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;
use crate::error::RenderError;
use crate::traits::PageRenderer;

/// Serves markup saved from an earlier browser session.
///
/// Useful for re-processing a captured page without launching Chromium; the
/// URL passed to `render` is only logged.
pub struct FileRenderer {
    path: PathBuf,
}

impl FileRenderer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PageRenderer for FileRenderer {
    fn renderer_name(&self) -> &str {
        "file"
    }

    async fn render(&mut self, url: &str) -> Result<String, RenderError> {
        info!(path = %self.path.display(), url = %url, "Reading saved page instead of rendering");
        let markup = tokio::fs::read_to_string(&self.path).await?;
        Ok(markup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_renderer_reads_markup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<ul><li data-type=\"review\"></li></ul>").unwrap();

        let mut renderer = FileRenderer::new(&path);
        let markup = renderer.render("https://example.org").await.unwrap();
        assert!(markup.contains("data-type"));
    }

    #[tokio::test]
    async fn test_file_renderer_missing_file() {
        let mut renderer = FileRenderer::new("/definitely/not/here.html");
        let err = renderer.render("https://example.org").await.unwrap_err();
        assert!(matches!(err, RenderError::Io(_)));
        assert!(!err.is_timeout());
    }
}
