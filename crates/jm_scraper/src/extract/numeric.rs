//! Ordered strategy chains for counts that the site renders inconsistently.
//!
//! Structured signals (button text, data attributes, count spans) are tried
//! before free-text pattern matching. The first strategy that yields a
//! parseable integer wins; if none does the count is 0.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use scraper::ElementRef;
use tracing::warn;

use super::{select_all, visible_text};

pub struct NumericChain {
    name: &'static str,
    buttons: &'static str,
    data_attrs: &'static [&'static str],
    spans: &'static str,
    patterns: Vec<Regex>,
}

/// Which strategy produced a count, mostly useful in debug logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    ButtonText,
    DataAttribute,
    Span,
    Pattern,
    Default,
}

lazy_static! {
    pub static ref LIKES: NumericChain = NumericChain::new(
        "likes",
        ".like-btn, .digg-btn, [class*='like'], [class*='digg']",
        &["data-likes", "data-count"],
        "span[class*='count'], span[class*='num'], span[class*='like']",
        &[r"点赞\s*(\d+)", r"(\d+)\s*赞", r"(\d+)\s*like", r"like\s*(\d+)"],
    );
    pub static ref REPLIES: NumericChain = NumericChain::new(
        "replies",
        ".reply-btn, .show-replies, [class*='reply']",
        &["data-replies", "data-count"],
        "span[class*='count'], span[class*='num'], span[class*='reply']",
        &[r"回复\s*(\d+)", r"(\d+)\s*回复", r"(\d+)\s*reply", r"reply\s*(\d+)"],
    );
}

impl NumericChain {
    fn new(
        name: &'static str,
        buttons: &'static str,
        data_attrs: &'static [&'static str],
        spans: &'static str,
        patterns: &[&str],
    ) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|p| match RegexBuilder::new(p).case_insensitive(true).build() {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("Dropping {} pattern {}: {}", name, p, e);
                    None
                }
            })
            .collect();
        Self {
            name,
            buttons,
            data_attrs,
            spans,
            patterns,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn extract(&self, scope: ElementRef) -> u64 {
        self.extract_with_strategy(scope).0
    }

    pub fn extract_with_strategy(&self, scope: ElementRef) -> (u64, Strategy) {
        for button in select_all(scope, self.buttons) {
            if let Some(n) = parse_count(&visible_text(button)) {
                return (n, Strategy::ButtonText);
            }
            let data = self
                .data_attrs
                .iter()
                .filter_map(|attr| button.value().attr(attr))
                .find(|v| !v.is_empty());
            if let Some(n) = data.and_then(parse_count) {
                return (n, Strategy::DataAttribute);
            }
        }

        for span in select_all(scope, self.spans) {
            if let Some(n) = parse_count(&visible_text(span)) {
                return (n, Strategy::Span);
            }
        }

        let text = visible_text(scope);
        for pattern in &self.patterns {
            let found = pattern
                .captures(&text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<u64>().ok());
            if let Some(n) = found {
                return (n, Strategy::Pattern);
            }
        }

        (0, Strategy::Default)
    }
}

/// Accepts only a non-empty run of ASCII digits that fits in a `u64`.
pub fn parse_count(text: &str) -> Option<u64> {
    let text = text.trim();
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn scope_of(html: &str) -> Html {
        Html::parse_fragment(&format!("<div id='scope'>{}</div>", html))
    }

    fn run(chain: &NumericChain, html: &str) -> (u64, Strategy) {
        let doc = scope_of(html);
        let sel = Selector::parse("#scope").unwrap();
        let scope = doc.select(&sel).next().unwrap();
        chain.extract_with_strategy(scope)
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(" 12 "), Some(12));
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("1.2k"), None);
        assert_eq!(parse_count("赞"), None);
        assert_eq!(parse_count("99999999999999999999999"), None);
    }

    #[test]
    fn test_button_text_wins() {
        let got = run(&LIKES, r#"<div class="like-btn" data-likes="99">7</div><span class="count">3</span>"#);
        assert_eq!(got, (7, Strategy::ButtonText));
    }

    #[test]
    fn test_data_attribute_when_button_text_is_not_numeric() {
        let got = run(&LIKES, r#"<div class="digg-btn" data-count="15">点赞</div><span class="num">3</span>"#);
        assert_eq!(got, (15, Strategy::DataAttribute));
    }

    #[test]
    fn test_span_before_patterns() {
        let got = run(&REPLIES, r#"<p>回复 40</p><span class="reply-count-num">8</span>"#);
        // `span[class*='reply']` is also a button candidate for replies
        assert_eq!(got, (8, Strategy::ButtonText));

        let got = run(&LIKES, r#"<p>点赞 40</p><span class="num">8</span>"#);
        assert_eq!(got, (8, Strategy::Span));
    }

    #[test]
    fn test_native_and_english_patterns() {
        assert_eq!(run(&LIKES, "<p>点赞 12</p>"), (12, Strategy::Pattern));
        assert_eq!(run(&LIKES, "<p>获得 6 赞</p>"), (6, Strategy::Pattern));
        assert_eq!(run(&LIKES, "<p>3 Likes</p>"), (3, Strategy::Pattern));
        assert_eq!(run(&REPLIES, "<p>回复 2</p>"), (2, Strategy::Pattern));
        assert_eq!(run(&REPLIES, "<p>REPLY 5</p>"), (5, Strategy::Pattern));
    }

    #[test]
    fn test_no_signal_is_exactly_zero() {
        assert_eq!(run(&LIKES, "<p>nothing to see</p>"), (0, Strategy::Default));
        assert_eq!(run(&REPLIES, r#"<div class="reply-btn">回复</div>"#), (0, Strategy::Default));
        assert_eq!(run(&LIKES, r#"<div class="like-btn" data-likes="lots">赞</div>"#), (0, Strategy::Default));
    }
}
