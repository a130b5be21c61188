//! Article body cleanup before Markdown conversion.

use scraper::node::Text;
use scraper::{Html, Node};
use tendril::StrTendril;

use super::select_first;
use crate::markdown;

pub const ARTICLE_ROOT: &str = "#article-root";
const CODE_BLOCK_HEADER: &str = "div.code-block-extension-header";
const INLINE_MARKUP: &str = "a, strong, b, em, i, del, s";

/// Strips the decorative code-block headers and hoists each `<code>`'s text
/// into its enclosing `<pre>`, in place. Whitespace at the inner edges of
/// inline markup is moved outside it so words don't fuse once converted.
/// Returns false when the page has no article container. Running it twice
/// yields the same tree.
pub fn normalize_article_root(document: &mut Html) -> bool {
    let root = match select_first(document.root_element(), ARTICLE_ROOT) {
        Some(root) => root,
        None => return false,
    };

    let headers: Vec<_> = super::select_all(root, CODE_BLOCK_HEADER)
        .into_iter()
        .map(|el| el.id())
        .collect();
    for id in headers {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    let root = match select_first(document.root_element(), ARTICLE_ROOT) {
        Some(root) => root,
        None => return false,
    };
    let blocks: Vec<_> = super::select_all(root, "pre")
        .into_iter()
        .filter_map(|pre| {
            select_first(pre, "code").map(|code| (pre.id(), code.text().collect::<String>()))
        })
        .collect();

    for (pre_id, code) in blocks {
        let children: Vec<_> = match document.tree.get(pre_id) {
            Some(pre) => pre.children().map(|c| c.id()).collect(),
            None => continue,
        };
        for child in children {
            if let Some(mut node) = document.tree.get_mut(child) {
                node.detach();
            }
        }
        if let Some(mut pre) = document.tree.get_mut(pre_id) {
            pre.append(text_node(code.trim()));
        }
    }

    hoist_edge_whitespace(document);
    true
}

fn text_node(text: &str) -> Node {
    Node::Text(Text {
        text: StrTendril::from_slice(text),
    })
}

fn hoist_edge_whitespace(document: &mut Html) {
    let inline: Vec<_> = match select_first(document.root_element(), ARTICLE_ROOT) {
        Some(root) => super::select_all(root, INLINE_MARKUP)
            .into_iter()
            .map(|el| el.id())
            .collect(),
        None => return,
    };

    for id in inline {
        let (first, last) = match document.tree.get(id) {
            Some(el) => (el.first_child().map(|c| c.id()), el.last_child().map(|c| c.id())),
            None => continue,
        };
        let leading = first
            .and_then(|child| document.tree.get_mut(child))
            .map_or(false, |mut child| trim_text(child.value(), str::trim_start));
        let trailing = last
            .and_then(|child| document.tree.get_mut(child))
            .map_or(false, |mut child| trim_text(child.value(), str::trim_end));

        if let Some(mut el) = document.tree.get_mut(id) {
            if leading {
                el.insert_before(text_node(" "));
            }
            if trailing {
                el.insert_after(text_node(" "));
            }
        }
    }
}

/// Trims a text node in place. Whitespace-only text is left alone.
fn trim_text(node: &mut Node, trim: fn(&str) -> &str) -> bool {
    if let Node::Text(text) = node {
        let trimmed = trim(&text.text);
        if trimmed.is_empty() || trimmed.len() == text.text.len() {
            return false;
        }
        text.text = StrTendril::from_slice(trimmed);
        return true;
    }
    false
}

/// Markdown for the (already normalized) article container.
pub fn article_markdown(document: &Html) -> Option<String> {
    select_first(document.root_element(), ARTICLE_ROOT).map(markdown::element_to_markdown)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODE_ARTICLE: &str = r#"
        <div id="article-root"><div class="markdown-body">
            <p>Intro</p>
            <pre><div class="code-block-extension-header"><span class="lang">javascript</span><span class="copy">复制代码</span></div><code class="hljs language-javascript">
const a = 1;
console.log(a);
</code></pre>
            <div class="code-block-extension-header"><span>bash</span></div>
            <pre><code>cargo run</code></pre>
        </div></div>
    "#;

    #[test]
    fn test_headers_removed_and_code_hoisted() {
        let mut doc = Html::parse_document(CODE_ARTICLE);
        assert!(normalize_article_root(&mut doc));
        let md = article_markdown(&doc).unwrap();

        assert!(!md.contains("复制代码"), "header leaked: {}", md);
        assert!(!md.contains("javascript"), "header leaked: {}", md);
        assert!(!md.contains("bash"), "header leaked: {}", md);
        assert!(md.contains("const a = 1;\nconsole.log(a);"), "got: {}", md);
        assert!(md.contains("cargo run"), "got: {}", md);

        let lines: Vec<&str> = md.lines().collect();
        for (i, line) in lines.iter().enumerate() {
            if line.contains("const a = 1;") || line.contains("cargo run") {
                assert!(i > 0 && !lines[i - 1].trim().is_empty(), "blank line before code: {:?}", md);
            }
            if line.contains("console.log(a);") || line.contains("cargo run") {
                assert!(lines.get(i + 1).map_or(false, |l| !l.trim().is_empty()), "blank line after code: {:?}", md);
            }
        }
    }

    #[test]
    fn test_pre_has_single_text_child() {
        let mut doc = Html::parse_document(CODE_ARTICLE);
        normalize_article_root(&mut doc);
        let sel = scraper::Selector::parse("pre").unwrap();
        for pre in doc.select(&sel) {
            assert_eq!(pre.children().count(), 1);
            assert!(select_first(pre, "code").is_none());
        }
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let mut doc = Html::parse_document(CODE_ARTICLE);
        normalize_article_root(&mut doc);
        let once = article_markdown(&doc).unwrap();
        normalize_article_root(&mut doc);
        let twice = article_markdown(&doc).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_inline_edge_whitespace_keeps_words_apart() {
        let mut doc = Html::parse_document(
            r#"<div id="article-root"><p>Use <strong>bold </strong>text and <a href="https://x.io"> link</a>here</p></div>"#,
        );
        assert!(normalize_article_root(&mut doc));

        let sel = scraper::Selector::parse("#article-root p").unwrap();
        let html = doc.select(&sel).next().unwrap().inner_html();
        assert!(html.contains("<strong>bold</strong> text"), "got: {}", html);
        assert!(html.contains(r#" <a href="https://x.io">link</a>here"#), "got: {}", html);

        let md = article_markdown(&doc).unwrap();
        let plain: String = md.replace(&['*', '[', ']'][..], "");
        let plain = plain.replace("(https://x.io)", "");
        let words: Vec<&str> = plain.split_whitespace().collect();
        assert_eq!(words, ["Use", "bold", "text", "and", "linkhere"], "got: {}", md);
    }

    #[test]
    fn test_missing_root() {
        let mut doc = Html::parse_document("<div id='other'></div>");
        assert!(!normalize_article_root(&mut doc));
        assert!(article_markdown(&doc).is_none());
    }
}
