use jm_core::types::defaults;
use jm_core::{CommentRecord, Error, ReplyRecord, Result};
use scraper::{ElementRef, Html};
use tracing::{debug, info, warn};

use super::numeric::{LIKES, REPLIES};
use super::{select_all, select_first, visible_text};

pub const COMMENT_ITEM: &str = ".comment-card.comment-item";
pub const REPLY_ITEM: &str = ".reply-item, .sub-comment";

/// Comments in page order, at most `max_comments`; a comment whose author or
/// body cannot be found is skipped rather than failing the page.
pub fn extract_comments(document: &Html, max_comments: usize, max_replies: usize) -> Vec<CommentRecord> {
    let elements = select_all(document.root_element(), COMMENT_ITEM);
    info!("Found {} comments", elements.len());

    let mut comments = Vec::new();
    for (i, element) in elements.into_iter().take(max_comments).enumerate() {
        match extract_comment(element, max_replies) {
            Ok(comment) => {
                debug!(
                    "Comment {}: {} likes={} replies={} captured={}",
                    i + 1,
                    comment.author,
                    comment.likes,
                    comment.reply_count,
                    comment.replies.len()
                );
                comments.push(comment);
            }
            Err(e) => warn!("Skipping comment {}: {}", i + 1, e),
        }
    }
    comments
}

pub fn extract_comment(element: ElementRef, max_replies: usize) -> Result<CommentRecord> {
    let author = select_first(element, ".username .name")
        .map(visible_text)
        .ok_or_else(|| Error::Scraping("comment has no author element".to_string()))?;
    let content = select_first(element, ".comment-content .content")
        .map(visible_text)
        .ok_or_else(|| Error::Scraping("comment has no content element".to_string()))?;

    Ok(CommentRecord {
        author,
        content: quote_continuation(&content),
        time: extract_time(element),
        likes: LIKES.extract(element),
        reply_count: REPLIES.extract(element),
        replies: extract_replies(element, max_replies),
    })
}

pub fn extract_replies(comment: ElementRef, max_replies: usize) -> Vec<ReplyRecord> {
    select_all(comment, REPLY_ITEM)
        .into_iter()
        .take(max_replies)
        .map(extract_reply)
        .collect()
}

/// Replies are leaves: every field has a default, so a reply is never dropped.
pub fn extract_reply(element: ElementRef) -> ReplyRecord {
    let author = select_first(element, ".username .name, .reply-author")
        .map(visible_text)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| defaults::USER.to_string());
    let content = select_first(element, ".reply-content, .content")
        .map(visible_text)
        .unwrap_or_default();

    ReplyRecord {
        author,
        content: quote_continuation(&content),
        time: extract_time(element),
        likes: LIKES.extract(element),
    }
}

fn extract_time(element: ElementRef) -> String {
    select_first(element, "[class*='time']")
        .map(visible_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| defaults::TIME.to_string())
}

/// Multi-line text stays inside the surrounding block quote.
pub fn quote_continuation(text: &str) -> String {
    text.replace('\n', "\n> ")
}
