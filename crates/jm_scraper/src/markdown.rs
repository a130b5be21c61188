//! Markdown for article bodies.
//!
//! Conversion itself is quick_html2md's; this module tidies its output:
//! outbound redirect links are unwrapped, fenced code loses the blank lines
//! hugging its fences, and runs of blank lines collapse to one.

use std::borrow::Cow;

use lazy_static::lazy_static;
use quick_html2md::{html_to_markdown_with_options, MarkdownOptions};
use regex::{Captures, Regex};
use scraper::ElementRef;
use url::Url;

const OUTBOUND_REDIRECT_HOST: &str = "link.juejin.cn";

lazy_static! {
    static ref REDIRECT_LINK: Regex =
        Regex::new(r"\]\((https?://link\.juejin\.cn/?[^\s)]*)\)").unwrap();
}

pub fn element_to_markdown(root: ElementRef) -> String {
    html_to_markdown(&root.inner_html())
}

pub fn html_to_markdown(html: &str) -> String {
    let options = MarkdownOptions::new()
        .include_links(true)
        .include_images(true)
        .preserve_tables(true);
    post_process_markdown(&html_to_markdown_with_options(html, &options))
}

pub fn post_process_markdown(markdown: &str) -> String {
    tidy_lines(&unwrap_redirects(markdown))
}

/// Outbound links go through a redirector; keep the real destination.
fn unwrap_redirects(markdown: &str) -> Cow<'_, str> {
    REDIRECT_LINK.replace_all(markdown, |caps: &Captures| {
        format!("]({})", resolve_href(&caps[1]))
    })
}

fn resolve_href(href: &str) -> String {
    if let Ok(url) = Url::parse(href) {
        if url.host_str() == Some(OUTBOUND_REDIRECT_HOST) {
            if let Some((_, target)) = url.query_pairs().find(|(k, _)| k == "target") {
                return target.into_owned();
            }
        }
    }
    href.to_string()
}

fn is_fence(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with("```") || line.starts_with("~~~")
}

/// A single separating blank line; a hard break before it means nothing.
fn push_blank(lines: &mut Vec<String>) {
    if let Some(last) = lines.last_mut() {
        if !last.is_empty() {
            let trimmed = last.trim_end().len();
            last.truncate(trimmed);
            lines.push(String::new());
        }
    }
}

/// Outside code: trailing spaces go (hard breaks excepted), blank runs
/// collapse to one, and the ends are trimmed. Inside code: lines are kept
/// verbatim except blank ones touching either fence.
fn tidy_lines(markdown: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut code: Option<Vec<&str>> = None;

    for line in markdown.lines() {
        if let Some(body) = code.as_mut() {
            if is_fence(line) {
                while body.last().map_or(false, |l| l.trim().is_empty()) {
                    body.pop();
                }
                lines.extend(body.drain(..).map(str::to_string));
                lines.push(line.trim_end().to_string());
                code = None;
            } else if !body.is_empty() || !line.trim().is_empty() {
                body.push(line);
            }
            continue;
        }

        if is_fence(line) {
            push_blank(&mut lines);
            lines.push(line.trim_end().to_string());
            code = Some(Vec::new());
        } else if line.trim().is_empty() {
            push_blank(&mut lines);
        } else if line.ends_with("  ") && !line.trim_end().is_empty() {
            lines.push(format!("{}  ", line.trim_end()));
        } else {
            lines.push(line.trim_end().to_string());
        }
    }

    // unterminated fence
    if let Some(body) = code {
        lines.extend(body.into_iter().map(str::to_string));
    }
    while lines.last().map_or(false, |l| l.trim().is_empty()) {
        lines.pop();
    }
    if let Some(last) = lines.last_mut() {
        let trimmed = last.trim_end().len();
        last.truncate(trimmed);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(markdown: &str) -> String {
        let link = Regex::new(r"!?\[([^\]]*)\]\([^)]*\)").unwrap();
        let plain = link.replace_all(markdown, "$1").replace(&['*', '_', '`', '#'][..], "");
        plain.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_blank_runs_collapse() {
        assert_eq!(
            post_process_markdown("\n\n# Title\n\n\n\nbody   \n\n\n\nend\n\n"),
            "# Title\n\nbody\n\nend"
        );
    }

    #[test]
    fn test_fence_blank_lines_trimmed_inside_only() {
        assert_eq!(
            post_process_markdown("intro\n```rust\n\n\nfn main() {\n\n    run();\n}\n\n```\nafter"),
            "intro\n\n```rust\nfn main() {\n\n    run();\n}\n```\nafter"
        );
    }

    #[test]
    fn test_code_indentation_untouched() {
        let md = "```\n    indented   \n\tтаб\n```";
        assert_eq!(post_process_markdown(md), md);
    }

    #[test]
    fn test_unterminated_fence_is_kept() {
        assert_eq!(post_process_markdown("```\n\ncode\n\n"), "```\ncode");
    }

    #[test]
    fn test_hard_break_survives() {
        assert_eq!(post_process_markdown("a  \nb"), "a  \nb");
    }

    #[test]
    fn test_redirect_links_unwrapped() {
        assert_eq!(
            post_process_markdown(
                "[repo](https://link.juejin.cn/?target=https%3A%2F%2Fgithub.com%2Frust-lang) and [book](https://doc.rust-lang.org/book/)"
            ),
            "[repo](https://github.com/rust-lang) and [book](https://doc.rust-lang.org/book/)"
        );
        // no target: left alone
        assert_eq!(
            post_process_markdown("[x](https://link.juejin.cn/?from=post)"),
            "[x](https://link.juejin.cn/?from=post)"
        );
    }

    #[test]
    fn test_converts_common_markup() {
        let md = html_to_markdown(
            r#"<h2>Intro</h2><p>Use <strong>care</strong> with <code>Pin</code>.</p>
               <p><a href="https://link.juejin.cn/?target=https%3A%2F%2Fgithub.com%2Frust-lang">repo</a></p>
               <ul><li>one</li><li>two</li></ul>"#,
        );
        assert!(md.contains("## Intro"), "got: {}", md);
        assert!(md.contains("**care**"), "got: {}", md);
        assert!(md.contains("`Pin`"), "got: {}", md);
        assert!(md.contains("(https://github.com/rust-lang)"), "got: {}", md);
        assert!(!md.contains("link.juejin.cn"), "got: {}", md);
        assert!(md.contains("one") && md.contains("two"), "got: {}", md);
        assert!(!md.contains("\n\n\n"), "got: {:?}", md);
        assert_eq!(md, md.trim());
    }

    #[test]
    fn test_code_block_has_no_blank_edges() {
        let md = html_to_markdown("<p>x</p><pre>\n\nlet a = 1;\n\n</pre>");
        let lines: Vec<&str> = md.lines().collect();
        let open = lines.iter().position(|l| is_fence(l)).expect("no opening fence");
        let close = open + 1 + lines[open + 1..].iter().position(|l| is_fence(l)).expect("no closing fence");
        assert_eq!(lines[open + 1..close], ["let a = 1;"], "got: {:?}", md);
    }

    #[test]
    fn test_words_stay_apart_around_inline_markup() {
        let md = html_to_markdown("<p>Use <strong>bold</strong> text and <a href=\"https://x.io\">link</a> here</p>");
        assert_eq!(words(&md), "Use bold text and link here", "got: {}", md);
    }
}
