pub mod crawler;
pub mod error;
pub mod index;
pub mod logger;
pub mod reader;
pub mod render;
pub mod utils;

pub use crawler::{ChapterJob, ChapterPipeline, ChapterResult, MangaCrawler, PageAsset};
pub use error::{FetchError, RenderError};
pub use render::{ChromeSession, Renderer};
