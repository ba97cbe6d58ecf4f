pub mod chromium;
pub mod file;

pub use chromium::ChromiumRenderer;
pub use file::FileRenderer;
