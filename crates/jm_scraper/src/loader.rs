//! Reveals lazily loaded comments and their nested replies on a live page.

use std::time::Duration;

use async_trait::async_trait;
use jm_core::{Result, ScrapeConfig};

use crate::logging::Logger;

/// What happened when the last "load more" control was looked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMoreOutcome {
    Clicked,
    /// Present but hidden or disabled; nothing more will load.
    Unavailable,
    Missing,
}

/// The slice of a live page the loader needs.
#[async_trait]
pub trait CommentSurface: Send {
    async fn count_comments(&mut self) -> Result<usize>;

    /// Clicks the last visible and enabled load-more control.
    async fn click_load_more(&mut self) -> Result<LoadMoreOutcome>;

    async fn scroll_to_bottom(&mut self) -> Result<()>;

    /// Clicks the reply toggle of the `index`-th comment; false when it has none.
    async fn expand_replies(&mut self, index: usize) -> Result<bool>;

    async fn pause(&mut self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Clicks "load more" until `max_comments` comments are visible, the control
/// disappears, or `max_load_attempts` is spent. Per-attempt errors are logged
/// and counted against the budget. Returns the last observed count.
pub async fn load_comments<S: CommentSurface + ?Sized>(
    surface: &mut S,
    config: &ScrapeConfig,
    log: &Logger,
) -> usize {
    if let Err(e) = surface.scroll_to_bottom().await {
        log.warn(&format!("Could not scroll to the comment section: {}", e));
    }
    surface.pause(config.initial_scroll_pause).await;

    let mut attempts = 0;
    let mut count = 0;
    while attempts < config.max_load_attempts {
        match surface.count_comments().await {
            Ok(n) => count = n,
            Err(e) => {
                log.warn(&format!("Load attempt {} failed: {}", attempts + 1, e));
                attempts += 1;
                surface.pause(config.error_pause).await;
                continue;
            }
        }
        log.debug(&format!("{} comments visible", count));
        if count >= config.max_comments {
            break;
        }

        match surface.click_load_more().await {
            Ok(LoadMoreOutcome::Clicked) => {
                attempts += 1;
                log.debug(&format!("Clicked load more ({}/{})", attempts, config.max_load_attempts));
                surface.pause(config.load_more_pause).await;
            }
            Ok(LoadMoreOutcome::Unavailable) => {
                log.debug("Load more control is hidden or disabled");
                break;
            }
            Ok(LoadMoreOutcome::Missing) => {
                log.debug("No load more control");
                break;
            }
            Err(e) => {
                log.warn(&format!("Load attempt {} failed: {}", attempts + 1, e));
                attempts += 1;
                surface.pause(config.error_pause).await;
            }
        }
    }

    match surface.count_comments().await {
        Ok(n) => count = n,
        Err(e) => log.warn(&format!("Could not recount comments: {}", e)),
    }
    log.info(&format!("Loaded {} comments", count));
    count
}

/// Opens the reply thread of each of the first `max_comments` comments.
/// Returns how many toggles were clicked.
pub async fn expand_replies<S: CommentSurface + ?Sized>(
    surface: &mut S,
    config: &ScrapeConfig,
    log: &Logger,
) -> usize {
    let visible = match surface.count_comments().await {
        Ok(n) => n,
        Err(e) => {
            log.warn(&format!("Could not count comments before expanding replies: {}", e));
            return 0;
        }
    };

    let mut expanded = 0;
    for index in 0..visible.min(config.max_comments) {
        match surface.expand_replies(index).await {
            Ok(true) => {
                expanded += 1;
                surface.pause(config.reply_expand_pause).await;
            }
            Ok(false) => {}
            Err(e) => log.warn(&format!("Could not expand replies of comment {}: {}", index + 1, e)),
        }
    }
    log.debug(&format!("Expanded {} reply threads", expanded));
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;
    use jm_core::Error;
    use std::collections::VecDeque;

    /// Scripted page: each click either reveals `batch` more comments or
    /// returns the next queued outcome.
    #[derive(Default)]
    struct FakeSurface {
        visible: usize,
        total: usize,
        batch: usize,
        scripted: VecDeque<Result<LoadMoreOutcome>>,
        clicks: usize,
        scrolled: bool,
        pauses: Vec<Duration>,
        reply_toggles: Vec<bool>,
        expanded: Vec<usize>,
    }

    #[async_trait]
    impl CommentSurface for FakeSurface {
        async fn count_comments(&mut self) -> Result<usize> {
            Ok(self.visible)
        }

        async fn click_load_more(&mut self) -> Result<LoadMoreOutcome> {
            if let Some(next) = self.scripted.pop_front() {
                if matches!(next, Ok(LoadMoreOutcome::Clicked)) {
                    self.clicks += 1;
                }
                return next;
            }
            if self.visible >= self.total {
                return Ok(LoadMoreOutcome::Missing);
            }
            self.clicks += 1;
            self.visible = (self.visible + self.batch).min(self.total);
            Ok(LoadMoreOutcome::Clicked)
        }

        async fn scroll_to_bottom(&mut self) -> Result<()> {
            self.scrolled = true;
            Ok(())
        }

        async fn expand_replies(&mut self, index: usize) -> Result<bool> {
            match self.reply_toggles.get(index) {
                Some(true) => {
                    self.expanded.push(index);
                    Ok(true)
                }
                Some(false) => Ok(false),
                None => Err(Error::Browser(format!("comment {} detached", index))),
            }
        }

        async fn pause(&mut self, duration: Duration) {
            self.pauses.push(duration);
        }
    }

    fn config() -> ScrapeConfig {
        ScrapeConfig::default()
    }

    #[tokio::test]
    async fn test_stops_once_target_is_visible() {
        let mut page = FakeSurface { visible: 4, total: 100, batch: 4, ..Default::default() };
        let count = load_comments(&mut page, &config(), &Logger::new()).await;
        assert_eq!(count, 12);
        assert_eq!(page.clicks, 2);
        assert!(page.scrolled);
        assert_eq!(page.pauses[0], Duration::from_secs(2));
        assert!(page.pauses[1..].iter().all(|p| *p == Duration::from_secs(3)));
    }

    #[tokio::test]
    async fn test_stops_when_control_is_missing() {
        let mut page = FakeSurface { visible: 3, total: 6, batch: 2, ..Default::default() };
        let count = load_comments(&mut page, &config(), &Logger::new()).await;
        assert_eq!(count, 6);
        assert_eq!(page.clicks, 2);
    }

    #[tokio::test]
    async fn test_stops_when_control_is_disabled() {
        let mut page = FakeSurface {
            visible: 2,
            total: 50,
            batch: 5,
            scripted: VecDeque::from(vec![Ok(LoadMoreOutcome::Unavailable)]),
            ..Default::default()
        };
        let count = load_comments(&mut page, &config(), &Logger::new()).await;
        assert_eq!(count, 2);
        assert_eq!(page.clicks, 0);
    }

    #[tokio::test]
    async fn test_attempt_budget_bounds_the_loop() {
        let scripted = (0..50).map(|_| Ok(LoadMoreOutcome::Clicked)).collect();
        let mut page = FakeSurface { visible: 1, total: 1, scripted, ..Default::default() };
        let count = load_comments(&mut page, &config(), &Logger::new()).await;
        assert_eq!(count, 1);
        assert_eq!(page.clicks, 20);
    }

    #[tokio::test]
    async fn test_errors_count_toward_budget_and_are_not_propagated() {
        let scripted = (0..30)
            .map(|_| Err(Error::Browser("node is detached".to_string())))
            .collect();
        let mut page = FakeSurface { visible: 0, total: 10, batch: 10, scripted, ..Default::default() };
        let count = load_comments(&mut page, &config(), &Logger::new()).await;
        assert_eq!(count, 0);
        assert_eq!(page.clicks, 0);
        let error_pauses = page.pauses.iter().filter(|p| **p == Duration::from_secs(1)).count();
        assert_eq!(error_pauses, 20);
    }

    #[tokio::test]
    async fn test_expand_replies_is_bounded_and_skips_failures() {
        // comments 4 and 5 have no entry in the fake, so expanding them errors
        let toggles = vec![true, false, true];
        let mut page = FakeSurface { visible: 5, reply_toggles: toggles, ..Default::default() };
        let clicked = expand_replies(&mut page, &config(), &Logger::new()).await;
        assert_eq!(clicked, 2);
        assert_eq!(page.expanded, vec![0, 2]);

        let mut page = FakeSurface { visible: 30, reply_toggles: vec![true; 30], ..Default::default() };
        let clicked = expand_replies(&mut page, &config(), &Logger::new()).await;
        assert_eq!(clicked, 10);
    }
}
