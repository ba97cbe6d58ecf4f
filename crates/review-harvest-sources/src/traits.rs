use async_trait::async_trait;
use crate::error::RenderError;

/// Something that turns a URL into fully rendered markup.
///
/// On success the markup must contain the script-rendered review list, and
/// scroll-triggered lazy loading must have fired at least twice.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    fn renderer_name(&self) -> &str;

    async fn render(&mut self, url: &str) -> Result<String, RenderError>;

    // Called once the run is over to free resources (e.g., close browser instances)
    async fn shutdown(&mut self) -> Result<(), RenderError> {
        Ok(())
    }
}
