//! Extraction from a rendered page snapshot.
//!
//! The browser is only used to render the page and trigger the dynamic
//! widgets; everything here runs on a static HTML snapshot so each extractor is
//! a plain function over a `scraper` tree.

use jm_core::{ArticleRecord, Error, Result, ScrapeConfig};
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

pub mod comments;
pub mod content;
pub mod fields;
pub mod numeric;

/// What the live page looked like once all dynamic content was revealed.
#[derive(Debug, Clone, Default)]
pub struct PageSnapshot {
    pub html: String,
    /// `document.body.innerText`; may be empty if the browser refused to give it.
    pub body_text: String,
}

/// Runs every extractor over the snapshot and assembles the record.
///
/// Field-level misses fall back to defaults; only a missing title or article
/// container fails the page.
pub fn extract_article(
    snapshot: &PageSnapshot,
    url: &str,
    config: &ScrapeConfig,
) -> Result<ArticleRecord> {
    let mut document = Html::parse_document(&snapshot.html);

    let title = fields::extract_title(&document)
        .ok_or_else(|| Error::Scraping("could not find the article title".to_string()))?;
    debug!("Article title: {}", title);

    let body_text = if snapshot.body_text.trim().is_empty() {
        document
            .select(&parse_selector("body")?)
            .next()
            .map(visible_text)
            .unwrap_or_default()
    } else {
        snapshot.body_text.clone()
    };

    let author = fields::extract_author(&document);
    let stats = fields::extract_stats(&document);
    let metadata = fields::extract_metadata(&document, &body_text);
    let comments = if config.include_comments {
        comments::extract_comments(&document, config.max_comments, config.max_replies)
    } else {
        Vec::new()
    };

    if !content::normalize_article_root(&mut document) {
        return Err(Error::Scraping(format!(
            "could not find article content with {}",
            content::ARTICLE_ROOT
        )));
    }
    let content = content::article_markdown(&document).ok_or_else(|| {
        Error::Scraping(format!("could not find article content with {}", content::ARTICLE_ROOT))
    })?;

    Ok(ArticleRecord {
        title,
        url: url.to_string(),
        author,
        content,
        stats,
        metadata,
        comments,
    })
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| Error::Scraping(format!("Invalid selector {}: {}", selector, e)))
}

/// Best-effort `select`: an invalid selector just matches nothing.
pub(crate) fn select_all<'a>(scope: ElementRef<'a>, selector: &str) -> Vec<ElementRef<'a>> {
    match parse_selector(selector) {
        Ok(sel) => scope.select(&sel).collect(),
        Err(e) => {
            debug!("{}", e);
            Vec::new()
        }
    }
}

pub(crate) fn select_first<'a>(scope: ElementRef<'a>, selector: &str) -> Option<ElementRef<'a>> {
    select_all(scope, selector).into_iter().next()
}

const BLOCK_TAGS: &[&str] = &[
    "div", "li", "ul", "ol", "pre", "blockquote", "section", "article", "h1", "h2", "h3", "h4",
    "h5", "h6", "tr", "table",
];

/// Paragraphs are separated by a blank line, like `innerText` does.
const PARAGRAPH_TAGS: &[&str] = &["p"];

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Approximates `innerText`: `<br>` and block boundaries become newlines,
/// paragraphs are separated by one blank line, whitespace inside a line is
/// collapsed.
pub fn visible_text(element: ElementRef) -> String {
    let mut collector = TextCollector::default();
    collector.walk(element);

    let mut lines: Vec<String> = Vec::new();
    for line in collector.out.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        let blank_run = line.is_empty() && lines.last().map_or(true, |l| l.is_empty());
        if !blank_run {
            lines.push(line);
        }
    }
    while lines.last().map_or(false, |l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

#[derive(Default)]
struct TextCollector {
    out: String,
    /// Line breaks owed before the next piece of text.
    pending: usize,
}

impl TextCollector {
    fn walk(&mut self, element: ElementRef) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.text(text),
                Node::Element(el) => {
                    let name = el.name();
                    if SKIPPED_TAGS.contains(&name) {
                        continue;
                    }
                    if name == "br" {
                        self.hard_break();
                        continue;
                    }
                    let breaks = if PARAGRAPH_TAGS.contains(&name) {
                        2
                    } else if BLOCK_TAGS.contains(&name) {
                        1
                    } else {
                        0
                    };
                    self.require(breaks);
                    if let Some(child_el) = ElementRef::wrap(child) {
                        self.walk(child_el);
                    }
                    self.require(breaks);
                }
                _ => {}
            }
        }
    }

    fn text(&mut self, raw: &str) {
        let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            if !raw.is_empty() && self.pending == 0 && !self.out.is_empty() {
                self.out.push(' ');
            }
            return;
        }
        if raw.starts_with(char::is_whitespace) && self.pending == 0 && !self.out.is_empty() {
            self.out.push(' ');
        }
        self.flush();
        self.out.push_str(&collapsed);
        if raw.ends_with(char::is_whitespace) {
            self.out.push(' ');
        }
    }

    fn require(&mut self, breaks: usize) {
        self.pending = self.pending.max(breaks);
    }

    fn flush(&mut self) {
        if !self.out.is_empty() {
            let trailing = self.out.chars().rev().take_while(|c| *c == '\n').count();
            for _ in trailing..self.pending {
                self.out.push('\n');
            }
        }
        self.pending = 0;
    }

    fn hard_break(&mut self) {
        self.flush();
        self.out.push('\n');
    }
}

/// Text of the element's direct text children only, like XPath `text()`.
pub fn own_text(element: ElementRef) -> String {
    element
        .children()
        .filter_map(|child| match child.value() {
            Node::Text(text) => Some(text.to_string()),
            _ => None,
        })
        .collect::<String>()
}
