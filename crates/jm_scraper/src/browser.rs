//! Chromium session driven over CDP.
//!
//! The session owns one browser process and one working tab. Pages are only
//! rendered and poked here; extraction happens later on a [`PageSnapshot`].

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use jm_core::{Error, Result, ScrapeConfig};
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::extract::comments::COMMENT_ITEM;
use crate::extract::PageSnapshot;
use crate::loader::{CommentSurface, LoadMoreOutcome};

const LOAD_MORE_BUTTON: &str = ".fetch-more-comment";
const REPLY_TOGGLE: &str = ".reply-btn, .show-replies";
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

const HIDE_WEBDRIVER: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
}

impl BrowserSession {
    pub async fn launch(config: &ScrapeConfig) -> Result<Self> {
        info!(
            "Launching Chromium ({})",
            if config.headless { "headless" } else { "headed" }
        );

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder
            .build()
            .map_err(|e| Error::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| Error::Browser(format!("Failed to launch browser: {}", e)))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| Error::Browser(format!("Failed to create page: {}", e)))?;
        page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(HIDE_WEBDRIVER))
            .await
            .map_err(|e| Error::Browser(format!("Failed to install page script: {}", e)))?;

        Ok(Self {
            browser,
            handler,
            page,
        })
    }

    pub fn page(&self) -> LivePage {
        LivePage {
            page: self.page.clone(),
        }
    }

    /// Navigates the working tab, bounded by `timeout`.
    pub async fn open(&self, url: &str, timeout: Duration) -> Result<()> {
        debug!("Navigating to {}", url);
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(Error::Browser(format!("Failed to open {}: {}", url, e))),
            Err(_) => Err(Error::Timeout {
                what: format!("navigation to {}", url),
                after: timeout,
            }),
        }
    }

    /// Polls until `selector` matches, or fails with [`Error::Timeout`].
    pub async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        let page = &self.page;
        poll_until(selector, timeout, move || async move {
            page.find_element(selector).await.is_ok()
        })
        .await
    }

    pub async fn snapshot(&self) -> Result<PageSnapshot> {
        let html = self
            .page
            .content()
            .await
            .map_err(|e| Error::Browser(format!("Failed to read page source: {}", e)))?;
        let body_text = match self.page.evaluate("document.body.innerText").await {
            Ok(value) => value.into_value::<String>().unwrap_or_default(),
            Err(e) => {
                warn!("Could not read body text: {}", e);
                String::new()
            }
        };
        Ok(PageSnapshot { html, body_text })
    }

    pub async fn close(mut self) -> Result<()> {
        info!("Closing browser");
        let closed = self
            .browser
            .close()
            .await
            .map_err(|e| Error::Browser(format!("Failed to close browser: {}", e)));
        if let Err(e) = self.browser.wait().await {
            debug!("Browser process did not exit cleanly: {}", e);
        }
        self.handler.abort();
        closed.map(|_| ())
    }
}

/// Re-runs `check` every poll interval until it holds or `timeout` elapses.
/// Any timeout is accepted, including ones too large to add to a clock.
async fn poll_until<F, Fut>(what: &str, timeout: Duration, mut check: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let polling = async {
        while !check().await {
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    };
    tokio::time::timeout(timeout, polling)
        .await
        .map_err(|_| Error::Timeout {
            what: what.to_string(),
            after: timeout,
        })
}

/// Handle on the working tab that the comment loader drives.
pub struct LivePage {
    page: Page,
}

impl LivePage {
    async fn eval<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| Error::Browser(format!("Script failed: {}", e)))?
            .into_value::<T>()
            .map_err(Error::from)
    }
}

#[async_trait]
impl CommentSurface for LivePage {
    async fn count_comments(&mut self) -> Result<usize> {
        self.eval(&count_script(COMMENT_ITEM)).await
    }

    async fn click_load_more(&mut self) -> Result<LoadMoreOutcome> {
        let outcome: String = self.eval(&load_more_script(LOAD_MORE_BUTTON)).await?;
        match outcome.as_str() {
            "clicked" => Ok(LoadMoreOutcome::Clicked),
            "unavailable" => Ok(LoadMoreOutcome::Unavailable),
            "missing" => Ok(LoadMoreOutcome::Missing),
            other => Err(Error::Browser(format!("Unexpected load-more result {:?}", other))),
        }
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        self.eval::<bool>("(() => { window.scrollTo(0, document.body.scrollHeight); return true; })()")
            .await
            .map(|_| ())
    }

    async fn expand_replies(&mut self, index: usize) -> Result<bool> {
        self.eval(&expand_replies_script(COMMENT_ITEM, REPLY_TOGGLE, index)).await
    }
}

const IS_CLICKABLE: &str = r#"
    const clickable = (el) => {
        const style = window.getComputedStyle(el);
        return el.offsetParent !== null
            && style.visibility !== 'hidden'
            && style.display !== 'none'
            && !el.disabled;
    };
"#;

fn count_script(selector: &str) -> String {
    format!("document.querySelectorAll({}).length", json!(selector))
}

fn load_more_script(selector: &str) -> String {
    format!(
        r#"(() => {{
    {clickable}
    const buttons = document.querySelectorAll({selector});
    if (buttons.length === 0) return 'missing';
    const last = buttons[buttons.length - 1];
    if (!clickable(last)) return 'unavailable';
    last.scrollIntoView({{ block: 'center' }});
    last.click();
    return 'clicked';
}})()"#,
        clickable = IS_CLICKABLE,
        selector = json!(selector),
    )
}

fn expand_replies_script(comment: &str, toggle: &str, index: usize) -> String {
    format!(
        r#"(() => {{
    {clickable}
    const comment = document.querySelectorAll({comment})[{index}];
    if (!comment) return false;
    const button = Array.from(comment.querySelectorAll({toggle})).find(clickable);
    if (!button) return false;
    button.click();
    return true;
}})()"#,
        clickable = IS_CLICKABLE,
        comment = json!(comment),
        toggle = json!(toggle),
        index = index,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors_are_quoted_as_js_strings() {
        assert_eq!(
            count_script(".comment-card.comment-item"),
            r#"document.querySelectorAll(".comment-card.comment-item").length"#
        );
        let script = expand_replies_script(COMMENT_ITEM, r#"[data-x="a"]"#, 3);
        assert!(script.contains(r#"querySelectorAll("[data-x=\"a\"]")"#));
        assert!(script.contains("[3]"));
    }

    #[tokio::test]
    async fn test_poll_until_accepts_unbounded_timeout() {
        let mut calls = 0;
        let result = poll_until("#article-root", Duration::MAX, || {
            calls += 1;
            let ready = calls >= 2;
            async move { ready }
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(calls, 2);

        let huge = Duration::from_secs(u64::MAX);
        assert!(poll_until("#article-root", huge, || async { true }).await.is_ok());
    }

    #[tokio::test]
    async fn test_poll_until_times_out() {
        let err = poll_until("#article-root", Duration::from_millis(20), || async { false })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert!(err.to_string().contains("#article-root"));
    }

    #[test]
    fn test_load_more_script_reports_every_outcome() {
        let script = load_more_script(LOAD_MORE_BUTTON);
        for outcome in ["'missing'", "'unavailable'", "'clicked'"] {
            assert!(script.contains(outcome), "{} missing from {}", outcome, script);
        }
        assert!(script.contains("buttons[buttons.length - 1]"));
    }
}
