use async_trait::async_trait;
use jm_core::{ArticleRecord, ArticleScraper, Error, Result, ScrapeConfig};

use super::utils;
use crate::browser::BrowserSession;
use crate::extract::comments::COMMENT_ITEM;
use crate::extract::content::ARTICLE_ROOT;
use crate::extract::extract_article;
use crate::loader;
use crate::logging::Logger;

const DOMAIN: &str = "juejin.cn";

pub struct JuejinScraper {
    session: Option<BrowserSession>,
    config: ScrapeConfig,
}

impl JuejinScraper {
    /// Starts the browser; one session serves every URL of the run.
    pub async fn launch(config: ScrapeConfig) -> Result<Self> {
        let session = BrowserSession::launch(&config).await?;
        Ok(Self {
            session: Some(session),
            config,
        })
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Scrolls the thread into view, loads up to `max_comments` comments and
    /// opens their replies. Nothing here can fail the page.
    async fn reveal_comments(session: &BrowserSession, config: &ScrapeConfig, log: &Logger) {
        if let Err(e) = session.wait_for_selector(COMMENT_ITEM, config.comment_wait).await {
            log.info(&format!("No comments rendered: {}", e));
            return;
        }
        let mut page = session.page();
        loader::load_comments(&mut page, config, log).await;
        loader::expand_replies(&mut page, config, log).await;
    }
}

pub fn is_juejin_url(url: &str) -> bool {
    utils::parse_url(url)
        .map(|parsed| utils::host_matches(&parsed, DOMAIN))
        .unwrap_or(false)
}

#[async_trait]
impl ArticleScraper for JuejinScraper {
    fn source(&self) -> &str {
        "juejin"
    }

    fn can_handle(&self, url: &str) -> bool {
        is_juejin_url(url)
    }

    async fn scrape_article(&mut self, url: &str) -> Result<ArticleRecord> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| Error::Browser("browser session is closed".to_string()))?;
        let log = Logger::new().with_prefix(self.source());

        session.open(url, self.config.page_timeout).await?;
        session
            .wait_for_selector(ARTICLE_ROOT, self.config.page_timeout)
            .await?;
        log.info(&format!("Processing {}", url));

        if self.config.include_comments {
            Self::reveal_comments(session, &self.config, &log).await;
        }

        let snapshot = session.snapshot().await?;
        let article = extract_article(&snapshot, url, &self.config)?;
        log.info(&format!(
            "Extracted \"{}\" with {} comments",
            article.title,
            article.comments.len()
        ));
        Ok(article)
    }

    async fn shutdown(&mut self) -> Result<()> {
        match self.session.take() {
            Some(session) => session.close().await,
            None => Ok(()),
        }
    }
}
