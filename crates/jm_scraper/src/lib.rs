pub mod browser;
pub mod cli;
pub mod extract;
pub mod loader;
pub mod logging;
pub mod manager;
pub mod markdown;
pub mod scrapers;

pub use cli::{handle_command, ScraperArgs};
pub use logging::{init_logging, Logger};
pub use manager::{OutputFormat, RunSummary, ScraperManager};
pub use scrapers::JuejinScraper;

pub mod prelude {
    pub use super::extract::{extract_article, PageSnapshot};
    pub use jm_core::{ArticleRecord, ArticleScraper, Error, Result, ScrapeConfig};
}
