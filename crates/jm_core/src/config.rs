use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MAX_COMMENTS: usize = 10;
pub const DEFAULT_MAX_REPLIES: usize = 5;
pub const DEFAULT_MAX_LOAD_ATTEMPTS: usize = 20;
pub const DEFAULT_PAGE_TIMEOUT_SECS: u64 = 10;

/// Knobs for one scraping run. Defaults match the values the tool has always
/// shipped with; the CLI only overrides what the user passes explicitly.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub headless: bool,
    /// Path to a Chrome/Chromium executable (None for auto-detection).
    pub chrome_path: Option<PathBuf>,
    pub include_comments: bool,
    pub max_comments: usize,
    pub max_replies: usize,
    pub max_load_attempts: usize,
    /// How long to wait for the article root to appear after navigation.
    pub page_timeout: Duration,
    /// How long to wait for the first comment card before giving up on comments.
    pub comment_wait: Duration,
    pub initial_scroll_pause: Duration,
    pub load_more_pause: Duration,
    pub error_pause: Duration,
    pub reply_expand_pause: Duration,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            include_comments: true,
            max_comments: DEFAULT_MAX_COMMENTS,
            max_replies: DEFAULT_MAX_REPLIES,
            max_load_attempts: DEFAULT_MAX_LOAD_ATTEMPTS,
            page_timeout: Duration::from_secs(DEFAULT_PAGE_TIMEOUT_SECS),
            comment_wait: Duration::from_secs(5),
            initial_scroll_pause: Duration::from_secs(2),
            load_more_pause: Duration::from_secs(3),
            error_pause: Duration::from_secs(1),
            reply_expand_pause: Duration::from_secs(1),
        }
    }
}

impl ScrapeConfig {
    /// Zero pauses, used by tests that drive the loader with a fake page.
    pub fn without_pauses(mut self) -> Self {
        self.initial_scroll_pause = Duration::ZERO;
        self.load_more_pause = Duration::ZERO;
        self.error_pause = Duration::ZERO;
        self.reply_expand_pause = Duration::ZERO;
        self
    }
}
