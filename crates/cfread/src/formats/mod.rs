// ABOUTME: Output format converters for extracted content.
// ABOUTME: Handles conversion of normalized HTML to Markdown and plain text.

//! Output format conversion module.
//!
//! The pipeline itself only produces HTML. These helpers turn bundle HTML into
//! Markdown or plain text for the CLI and for callers that do not render markup.

use dom_query::{Document, NodeRef};
use once_cell::sync::Lazy;
use regex::Regex;

static BR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?\s*>").unwrap());
static BLANK_LINES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static NEWLINES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());
static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());

/// Elements that start a new line in plain-text output.
const TEXT_BLOCK_TAGS: &[&str] = &[
    "p", "div", "li", "ul", "ol", "pre", "h1", "h2", "h3", "h4", "h5", "h6", "tr", "details",
    "summary", "blockquote", "table",
];

/// Convert HTML to Markdown using htmd.
///
/// Skips script and style tags, preserves links, images and code blocks, and
/// normalizes consecutive blank lines to max 2. On conversion error, returns
/// the input unchanged.
pub fn html_to_markdown(html: &str) -> String {
    let preprocessed = BR_RE.replace_all(html, "\n").to_string();

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "noscript"])
        .build();

    let md = converter
        .convert(&preprocessed)
        .unwrap_or_else(|_| preprocessed.clone());

    BLANK_LINES_RE.replace_all(&md, "\n\n").to_string()
}

fn push_text(node: &NodeRef, out: &mut String) {
    if node.is_text() {
        out.push_str(&node.text());
        return;
    }
    let name = node
        .node_name()
        .map(|n| n.to_ascii_lowercase())
        .unwrap_or_default();
    if matches!(name.as_str(), "script" | "style" | "noscript") {
        return;
    }
    if name == "br" {
        out.push('\n');
        return;
    }
    let block = TEXT_BLOCK_TAGS.contains(&name.as_str());
    if block {
        out.push('\n');
    }
    for child in node.children() {
        push_text(&child, out);
    }
    if block {
        out.push('\n');
    }
}

/// Convert HTML to plain text.
///
/// Block elements and `<br>` become line breaks, runs of horizontal whitespace
/// collapse to one space, blank lines collapse, and the result is trimmed.
pub fn html_to_text(html: &str) -> String {
    let document = Document::from(html);
    let mut raw = String::new();
    push_text(&document.root(), &mut raw);

    let spaced = SPACES_RE.replace_all(&raw, " ");
    let lines = spaced
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    NEWLINES_RE.replace_all(&lines, "\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_to_markdown_converts_complex_html() {
        let html = "<h2>Title</h2><p>Some <strong>bold</strong> text.</p>";
        let md = html_to_markdown(html);
        assert!(md.contains("## Title"), "expected markdown h2, got: {}", md);
        assert!(md.contains("**bold**"), "expected bold markdown, got: {}", md);
    }

    #[test]
    fn html_to_markdown_returns_empty_on_empty() {
        assert_eq!(html_to_markdown(""), "");
    }

    #[test]
    fn html_to_markdown_skips_script_and_style() {
        let html = "<p>Before</p><script>alert(1)</script><style>.x{}</style><p>After</p>";
        let md = html_to_markdown(html);
        assert!(!md.contains("alert"), "got: {}", md);
        assert!(!md.contains(".x{}"), "got: {}", md);
        assert!(md.contains("Before") && md.contains("After"), "got: {}", md);
    }

    #[test]
    fn html_to_markdown_collapses_excessive_blank_lines() {
        let md = html_to_markdown("<p>Para 1</p>\n\n\n\n\n<p>Para 2</p>");
        assert!(!md.contains("\n\n\n"), "got: {:?}", md);
    }

    #[test]
    fn html_to_markdown_preserves_absolute_images() {
        let html = r#"<img src="https://codeforces.com/predownloaded/a.png" alt="fig">"#;
        let md = html_to_markdown(html);
        assert!(
            md.contains("![fig](https://codeforces.com/predownloaded/a.png)"),
            "got: {}",
            md
        );
    }

    #[test]
    fn html_to_text_collapses_whitespace() {
        assert_eq!(html_to_text("<p>Hello   world</p>"), "Hello world");
    }

    #[test]
    fn html_to_text_separates_blocks() {
        let text = html_to_text("<div><p>First</p><p>Second <em>part</em></p></div>");
        assert_eq!(text, "First\nSecond part");
    }

    #[test]
    fn html_to_text_keeps_sample_lines() {
        let text = html_to_text("<pre>3\n1 2 3</pre><p>Done</p>");
        assert_eq!(text, "3\n1 2 3\nDone");
    }

    #[test]
    fn html_to_text_skips_scripts() {
        assert_eq!(html_to_text("<p>Hi</p><script>var x = 1;</script>"), "Hi");
    }
}
