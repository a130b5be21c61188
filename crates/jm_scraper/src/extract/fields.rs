//! Page-level fields: title, author, badge statistics and metadata.
//!
//! Every extractor here is independent; a miss in one never affects another.

use jm_core::types::defaults;
use jm_core::{ArticleMetadata, ArticleStats, AuthorInfo};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::Html;
use tracing::{debug, warn};
use url::Url;

use super::{own_text, select_all, select_first, visible_text};

pub const SITE_BASE_URL: &str = "https://juejin.cn";

const MAX_COLUMN_LABEL_CHARS: usize = 50;
const COLUMN_MARKER: &str = "专栏";
const NON_RENDERED_TAGS: &[&str] = &["script", "style", "noscript", "template", "title"];

lazy_static! {
    static ref READ_TIME_PATTERNS: Vec<Regex> = [r"阅读(\d+分钟)", r"(?i)(\d+\s*min(?:ute)?s?)\s*read"]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect();
}

pub fn extract_title(document: &Html) -> Option<String> {
    let root = document.root_element();
    select_first(root, "h1.article-title")
        .or_else(|| select_first(root, "title"))
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

pub fn extract_author(document: &Html) -> AuthorInfo {
    let root = document.root_element();

    // Header block of the article page.
    if let Some(link) = select_first(root, ".author-info-block .author-name a") {
        let name = select_first(link, ".name")
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();
        let href = link.value().attr("href").unwrap_or_default();
        if !name.is_empty() && !href.is_empty() {
            debug!("Author from info block: {}", name);
            return AuthorInfo {
                name,
                url: Some(absolute_url(href)),
            };
        }
    }

    // Any profile link pointing at the author's post list.
    for link in select_all(root, "a[href*='/user/']") {
        let href = match link.value().attr("href") {
            Some(href) if href.contains("/user/") && href.contains("posts") => href,
            _ => continue,
        };
        let name = select_first(link, ".name, .username")
            .map(visible_text)
            .unwrap_or_default();
        if !name.is_empty() {
            debug!("Author from profile link: {}", name);
            return AuthorInfo {
                name,
                url: Some(absolute_url(href)),
            };
        }
    }

    if let Some(el) = select_first(root, ".user-name, .username, .author-name") {
        let name = visible_text(el);
        if !name.is_empty() {
            debug!("Author from name element: {}", name);
            return AuthorInfo { name, url: None };
        }
    }

    warn!("Could not find the article author");
    AuthorInfo::default()
}

/// Resolves site-relative links; anything that is not a valid URL is kept as-is.
pub fn absolute_url(href: &str) -> String {
    Url::parse(SITE_BASE_URL)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Reads the floating badge panel (likes, comments, collects).
pub fn extract_stats(document: &Html) -> ArticleStats {
    let mut stats = ArticleStats::default();
    let buttons = select_all(document.root_element(), ".panel-btn.with-badge");
    debug!("Found {} badge buttons", buttons.len());

    for button in buttons {
        let badge = match button.value().attr("badge").map(str::trim) {
            Some(badge) if !badge.is_empty() => badge,
            _ => continue,
        };
        let icon_class = select_first(button, "svg")
            .and_then(|svg| svg.value().attr("class"))
            .unwrap_or_default();
        let slot = if icon_class.contains("icon-zan") {
            &mut stats.likes
        } else if icon_class.contains("icon-comment") {
            &mut stats.comments
        } else if icon_class.contains("icon-collect") {
            &mut stats.collects
        } else {
            continue;
        };
        match badge.parse::<u64>() {
            Ok(n) => *slot = n,
            Err(e) => warn!("Ignoring badge {:?} on {}: {}", badge, icon_class, e),
        }
    }

    stats
}

pub fn extract_metadata(document: &Html, body_text: &str) -> ArticleMetadata {
    ArticleMetadata {
        publish_time: extract_publish_time(document),
        read_time: extract_read_time(body_text),
        column: extract_column(document),
    }
}

pub fn extract_publish_time(document: &Html) -> String {
    let root = document.root_element();
    select_first(root, "time.time")
        .or_else(|| select_first(root, "[class*='time']"))
        .map(visible_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| defaults::TIME.to_string())
}

pub fn extract_read_time(body_text: &str) -> String {
    READ_TIME_PATTERNS
        .iter()
        .find_map(|re| re.captures(body_text).and_then(|c| c.get(1)))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| defaults::READ_TIME.to_string())
}

/// The column label is a short rendered element in the body whose own text
/// mentions the column marker.
pub fn extract_column(document: &Html) -> String {
    let root = document.root_element();
    select_first(root, "body")
        .unwrap_or(root)
        .descendants()
        .filter_map(scraper::ElementRef::wrap)
        .filter(|el| !NON_RENDERED_TAGS.contains(&el.value().name()))
        .filter(|el| own_text(*el).contains(COLUMN_MARKER))
        .map(visible_text)
        .find(|text| text.contains(COLUMN_MARKER) && text.chars().count() < MAX_COLUMN_LABEL_CHARS)
        .unwrap_or_else(|| defaults::COLUMN.to_string())
}
