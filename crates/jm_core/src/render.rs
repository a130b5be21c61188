//! Markdown document template for a scraped article.

use std::fmt::Write;

use crate::types::{ArticleRecord, CommentRecord};

/// Renders the article into the fixed document layout: heading, author line,
/// a seven-row info table, the body, and (only when comments were captured)
/// the comment list ranked by likes.
pub fn render_markdown(article: &ArticleRecord, max_comments: usize) -> String {
    let mut md = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(md, "# {}\n", article.title);

    match &article.author.url {
        Some(url) => {
            let _ = writeln!(md, "**Author:** [{}]({})\n", article.author.name, url);
        }
        None => {
            let _ = writeln!(md, "**Author:** {}\n", article.author.name);
        }
    }

    md.push_str("## 📊 Article Info\n\n");
    md.push_str("| Item | Value |\n");
    md.push_str("|------|------|\n");
    for (label, value) in info_rows(article) {
        let _ = writeln!(md, "| {} | {} |", label, escape_cell(&value));
    }
    md.push('\n');

    md.push_str("---\n\n");
    md.push_str("## 📝 Content\n\n");
    md.push_str(&article.content);

    if !article.comments.is_empty() {
        md.push_str("\n\n---\n\n");
        md.push_str("## 💬 Top Comments\n\n");
        for comment in rank_comments(&article.comments, max_comments) {
            render_comment(&mut md, comment);
        }
    }

    md
}

/// The info table, always in this order regardless of what was extracted.
fn info_rows(article: &ArticleRecord) -> [(&'static str, String); 7] {
    [
        ("Published", article.metadata.publish_time.clone()),
        ("Likes", article.stats.likes.to_string()),
        ("Comments", article.stats.comments.to_string()),
        ("Collects", article.stats.collects.to_string()),
        ("Read Time", article.metadata.read_time.clone()),
        ("Column", article.metadata.column.clone()),
        ("Original Link", format!("[{}]({})", article.title, article.url)),
    ]
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

/// Most-liked first; `sort_by` is stable so ties keep page order.
pub fn rank_comments(comments: &[CommentRecord], max_comments: usize) -> Vec<&CommentRecord> {
    let mut ranked: Vec<&CommentRecord> = comments.iter().collect();
    ranked.sort_by(|a, b| b.likes.cmp(&a.likes));
    ranked.truncate(max_comments);
    ranked
}

fn render_comment(md: &mut String, comment: &CommentRecord) {
    let _ = writeln!(
        md,
        "### {} 👍 {} 💬 {} {}\n",
        comment.author, comment.likes, comment.reply_count, comment.time
    );
    let _ = writeln!(md, "{}\n", comment.content);

    if !comment.replies.is_empty() {
        md.push_str("**Replies:**\n\n");
        for reply in &comment.replies {
            let _ = writeln!(md, "**{} (👍 {}) - {}**\n", reply.author, reply.likes, reply.time);
            let _ = writeln!(md, "> {}\n", reply.content);
        }
    }

    md.push_str("---\n\n");
}
