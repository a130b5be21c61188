use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use jm_core::config::{
    DEFAULT_MAX_COMMENTS, DEFAULT_MAX_REPLIES, DEFAULT_PAGE_TIMEOUT_SECS,
};
use jm_core::{Result, ScrapeConfig};

use crate::logging::Logger;
use crate::manager::{default_output_dir, OutputFormat, RunSummary, ScraperManager};
use crate::scrapers::JuejinScraper;

const MAX_PAGE_TIMEOUT_SECS: u64 = 3600;

#[derive(Args, Debug, Clone)]
pub struct ScraperArgs {
    /// Article URLs to save, processed in order
    #[arg(required = true, num_args = 1.., value_name = "URL")]
    pub urls: Vec<String>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,

    /// Maximum number of comments to load and render
    #[arg(long, default_value_t = DEFAULT_MAX_COMMENTS)]
    pub max_comments: usize,

    /// Maximum number of replies kept per comment
    #[arg(long, default_value_t = DEFAULT_MAX_REPLIES)]
    pub max_replies: usize,

    /// Skip comment loading and extraction entirely
    #[arg(long)]
    pub no_comments: bool,

    /// Where to write files (defaults to the home directory)
    #[arg(long, value_name = "PATH")]
    pub output_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
    pub format: OutputFormat,

    /// Seconds to wait for the article to render
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = DEFAULT_PAGE_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..=MAX_PAGE_TIMEOUT_SECS)
    )]
    pub timeout: u64,

    /// Chrome/Chromium executable to use instead of auto-detection
    #[arg(long, value_name = "PATH")]
    pub chrome: Option<PathBuf>,
}

impl ScraperArgs {
    pub fn to_config(&self) -> ScrapeConfig {
        ScrapeConfig {
            headless: !self.headed,
            chrome_path: self.chrome.clone(),
            include_comments: !self.no_comments,
            max_comments: self.max_comments,
            max_replies: self.max_replies,
            page_timeout: Duration::from_secs(self.timeout),
            ..ScrapeConfig::default()
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(default_output_dir)
    }
}

/// Launches the browser and saves every URL. Only a failed launch is an
/// error; per-URL failures end up in the summary.
pub async fn handle_command(args: ScraperArgs, log: &Logger) -> Result<RunSummary> {
    let config = args.to_config();
    let max_comments = config.max_comments;
    let scraper = JuejinScraper::launch(config).await?;

    let manager = ScraperManager::new(scraper, args.output_dir(), max_comments).with_format(args.format);
    log.info(&format!("Writing to {}", manager.output_dir().display()));
    Ok(manager.run(&args.urls, log).await)
}
