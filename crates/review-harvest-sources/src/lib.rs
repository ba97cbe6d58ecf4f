pub mod error;
pub mod renderer;
pub mod reviews;
pub mod traits;

pub use error::RenderError;
pub use renderer::{ChromiumRenderer, FileRenderer};
pub use reviews::{extract_reviews, Extractor, Harvest, Normalized, RawFragment, RawReview};
pub use traits::PageRenderer;
