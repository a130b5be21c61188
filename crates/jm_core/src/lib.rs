pub mod config;
pub mod error;
pub mod render;
pub mod scraper;
pub mod types;

pub use config::ScrapeConfig;
pub use error::{Error, Result};
pub use render::render_markdown;
pub use scraper::ArticleScraper;
pub use types::{
    ArticleMetadata, ArticleRecord, ArticleStats, AuthorInfo, CommentRecord, ReplyRecord,
};
