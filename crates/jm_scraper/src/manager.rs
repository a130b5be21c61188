use std::path::{Path, PathBuf};

use clap::ValueEnum;
use directories::UserDirs;
use jm_core::{render_markdown, ArticleRecord, ArticleScraper, Error, Result};

use crate::logging::Logger;
use crate::scrapers::utils;

const UNSAFE_FILENAME_CHARS: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|'];
const FALLBACK_FILENAME: &str = "untitled";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }

    fn render(&self, article: &ArticleRecord, max_comments: usize) -> Result<String> {
        match self {
            OutputFormat::Markdown => Ok(render_markdown(article, max_comments)),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(article)?),
        }
    }
}

#[derive(Debug)]
pub struct UrlOutcome {
    pub url: String,
    pub result: std::result::Result<PathBuf, String>,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<UrlOutcome>,
}

impl RunSummary {
    pub fn saved(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|p| (o.url.as_str(), p.as_path())))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.url.as_str(), e.as_str())))
    }

    pub fn saved_count(&self) -> usize {
        self.saved().count()
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }
}

/// Runs URLs one after another through a single scraper and writes one file
/// per article.
pub struct ScraperManager<S: ArticleScraper> {
    scraper: S,
    output_dir: PathBuf,
    format: OutputFormat,
    max_comments: usize,
}

impl<S: ArticleScraper> ScraperManager<S> {
    pub fn new(scraper: S, output_dir: impl Into<PathBuf>, max_comments: usize) -> Self {
        Self {
            scraper,
            output_dir: output_dir.into(),
            format: OutputFormat::default(),
            max_comments,
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Scrapes one URL and writes it, overwriting any file of the same name.
    pub async fn save_url(&mut self, url: &str) -> Result<PathBuf> {
        let parsed = utils::parse_url(url)?;
        if !self.scraper.can_handle(parsed.as_str()) {
            return Err(Error::InvalidUrl(format!(
                "{} is not supported by the {} scraper",
                url,
                self.scraper.source()
            )));
        }

        let article = self.scraper.scrape_article(url).await?;
        let body = self.format.render(&article, self.max_comments)?;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(format!(
            "{}.{}",
            sanitize_filename(&article.title),
            self.format.extension()
        ));
        tokio::fs::write(&path, body).await?;
        Ok(path)
    }

    /// Processes every URL in order; a failure is recorded and the run goes on.
    /// The scraper is shut down once all URLs were attempted.
    pub async fn run(mut self, urls: &[String], log: &Logger) -> RunSummary {
        let mut summary = RunSummary::default();
        let total = urls.len();

        for (i, url) in urls.iter().enumerate() {
            let log = log.clone().with_prefix(format!("[{}/{}]", i + 1, total));
            log.info(&format!("Scraping {}", url));
            let result = match self.save_url(url).await {
                Ok(path) => {
                    log.info(&format!("✅ Saved to {}", path.display()));
                    Ok(path)
                }
                Err(e) => {
                    log.error(&format!("❌ {}: {}", url, e));
                    Err(e.to_string())
                }
            };
            summary.outcomes.push(UrlOutcome {
                url: url.clone(),
                result,
            });
        }

        if let Err(e) = self.scraper.shutdown().await {
            log.warn(&format!("Scraper did not shut down cleanly: {}", e));
        }
        summary
    }
}

/// Drops characters that are unsafe in file names and turns spaces into `_`.
pub fn sanitize_filename(title: &str) -> String {
    let name: String = title
        .chars()
        .filter(|c| !UNSAFE_FILENAME_CHARS.contains(c))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect();
    if name.trim_matches('_').trim().is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        name
    }
}

/// The user's home directory, or the working directory when it is unknown.
pub fn default_output_dir() -> PathBuf {
    UserDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
