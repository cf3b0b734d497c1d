// ABOUTME: DOM manipulation and traversal utilities over dom_query's arena tree.
// ABOUTME: Node handles are collected into snapshot Vecs before any mutation.

//! DOM utilities for in-place document manipulation.
//!
//! `dom_query` stores a document as an arena addressed by `NodeId`; a
//! `NodeRef` is a cheap handle into it. Helpers here never hand out live
//! iterators: queries return `Vec`s so callers can remove or reparent nodes
//! while walking the result.

pub mod brs;
pub mod normalize;

use dom_query::{NodeRef, Selection};

use crate::extractors::compiled::get_or_compile;

/// All descendants of `root` matching `css`, in document order.
pub fn select_all<'a>(root: &NodeRef<'a>, css: &str) -> Vec<NodeRef<'a>> {
    match get_or_compile(css) {
        Some(matcher) => Selection::from(*root)
            .select_matcher(&matcher)
            .nodes()
            .to_vec(),
        None => Vec::new(),
    }
}

/// First descendant of `root` matching `css`.
pub fn select_first<'a>(root: &NodeRef<'a>, css: &str) -> Option<NodeRef<'a>> {
    select_all(root, css).into_iter().next()
}

/// Lower-case tag name, `None` for non-element nodes.
pub fn tag_name(node: &NodeRef) -> Option<String> {
    if !node.is_element() {
        return None;
    }
    node.node_name().map(|n| n.to_ascii_lowercase())
}

/// True if `node` is an element whose tag is one of `tags`.
pub fn has_tag<S: AsRef<str>>(node: &NodeRef, tags: &[S]) -> bool {
    tag_name(node)
        .map(|name| tags.iter().any(|t| t.as_ref().eq_ignore_ascii_case(&name)))
        .unwrap_or(false)
}

/// Nearest inclusive ancestor satisfying `pred`.
pub fn closest<'a, F>(node: &NodeRef<'a>, pred: F) -> Option<NodeRef<'a>>
where
    F: Fn(&NodeRef<'a>) -> bool,
{
    let mut current = Some(*node);
    while let Some(n) = current {
        if pred(&n) {
            return Some(n);
        }
        current = n.parent();
    }
    None
}

/// True if a strict ancestor of `node` has one of `tags`.
pub fn inside_tag<S: AsRef<str>>(node: &NodeRef, tags: &[S]) -> bool {
    node.parent()
        .and_then(|p| closest(&p, |n| has_tag(n, tags)))
        .is_some()
}

/// Element children of `node`, snapshotted.
pub fn child_elements<'a>(node: &NodeRef<'a>) -> Vec<NodeRef<'a>> {
    node.children()
        .into_iter()
        .filter(|c| c.is_element())
        .collect()
}

/// Next sibling that is an element, skipping text and comments.
pub fn next_element<'a>(node: &NodeRef<'a>) -> Option<NodeRef<'a>> {
    let mut current = node.next_sibling();
    while let Some(n) = current {
        if n.is_element() {
            return Some(n);
        }
        current = n.next_sibling();
    }
    None
}

/// Descendant text of `node`, trimmed.
pub fn trimmed_text(node: &NodeRef) -> String {
    node.text().trim().to_string()
}

/// Attribute value, trimmed; `None` when absent.
pub fn attr(node: &NodeRef, name: &str) -> Option<String> {
    node.attr(name).map(|v| v.trim().to_string())
}

/// Replace `node` with its children, keeping their order.
pub fn unwrap_node(node: &NodeRef) {
    for child in node.children() {
        node.insert_before(&child.id);
    }
    node.remove_from_parent();
}

/// Replace `node` with a fresh, attribute-less `tag` element holding its children.
pub fn replace_tag<'a>(node: &NodeRef<'a>, tag: &str) -> NodeRef<'a> {
    let replacement = node.tree.new_element(tag);
    for child in node.children() {
        replacement.append_child(&child.id);
    }
    node.insert_before(&replacement.id);
    node.remove_from_parent();
    replacement
}

/// Replace `node` with a text node.
pub fn replace_with_text(node: &NodeRef, text: &str) {
    let text_node = node.tree.new_text(text);
    node.insert_before(&text_node.id);
    node.remove_from_parent();
}

/// Drop every child of `node` and give it a single text child.
pub fn set_text_content(node: &NodeRef, text: &str) {
    for child in node.children() {
        child.remove_from_parent();
    }
    let text_node = node.tree.new_text(text);
    node.append_child(&text_node.id);
}

/// Append a text node to `node`.
pub fn append_text(node: &NodeRef, text: &str) {
    let text_node = node.tree.new_text(text);
    node.append_child(&text_node.id);
}

/// Escape text for inclusion in HTML element content.
pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom_query::Document;

    fn body<'a>(doc: &'a Document) -> NodeRef<'a> {
        select_first(&doc.root(), "body").unwrap()
    }

    #[test]
    fn closest_includes_self() {
        let doc = Document::from(r#"<div class="sample-test"><pre><span>x</span></pre></div>"#);
        let pre = select_first(&doc.root(), "pre").unwrap();
        assert!(closest(&pre, |n| has_tag(n, &["pre"])).is_some());
        assert!(!inside_tag(&pre, &["pre"]));
        let span = select_first(&doc.root(), "span").unwrap();
        assert!(inside_tag(&span, &["pre"]));
    }

    #[test]
    fn next_element_skips_text() {
        let doc = Document::from("<p>a</p>\n  <hr><p>b</p>");
        let p = select_first(&doc.root(), "p").unwrap();
        assert_eq!(tag_name(&next_element(&p).unwrap()).as_deref(), Some("hr"));
    }

    #[test]
    fn unwrap_node_keeps_children_in_place() {
        let doc = Document::from(r#"<p>a <font color="red">b <i>c</i></font> d</p>"#);
        let font = select_first(&doc.root(), "font").unwrap();
        unwrap_node(&font);
        assert_eq!(body(&doc).inner_html().to_string(), "<p>a b <i>c</i> d</p>");
    }

    #[test]
    fn replace_tag_drops_attributes() {
        let doc = Document::from(r#"<p><span class="tex-font-style-bf" style="x">n</span></p>"#);
        let span = select_first(&doc.root(), "span").unwrap();
        replace_tag(&span, "strong");
        assert_eq!(body(&doc).inner_html().to_string(), "<p><strong>n</strong></p>");
    }

    #[test]
    fn set_text_content_replaces_children() {
        let doc = Document::from("<pre><div>1</div><div>2</div></pre>");
        let pre = select_first(&doc.root(), "pre").unwrap();
        set_text_content(&pre, "1\n2");
        assert_eq!(pre.text().to_string(), "1\n2");
        assert!(select_all(&pre, "div").is_empty());
    }

    #[test]
    fn escape_text_handles_markup() {
        assert_eq!(escape_text("a < b & c"), "a &lt; b &amp; c");
    }
}
