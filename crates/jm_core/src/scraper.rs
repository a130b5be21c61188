use async_trait::async_trait;

use crate::types::ArticleRecord;
use crate::Result;

#[async_trait]
pub trait ArticleScraper: Send {
    /// Returns the name of the site this scraper understands
    fn source(&self) -> &str;

    /// Returns true if this scraper can handle the given URL
    fn can_handle(&self, url: &str) -> bool;

    /// Loads the page behind `url` and extracts everything needed to render it
    async fn scrape_article(&mut self, url: &str) -> Result<ArticleRecord>;

    /// Releases whatever the scraper holds (browser processes, pages)
    async fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}
