// ABOUTME: In-place HTML normalizer turning site markup into clean semantic HTML.
// ABOUTME: Style-span mapping, paragraph merging, <br> cleanup and empty-node pruning.

//! Normalization passes.
//!
//! The first four passes are single sweeps. Merging, `<br>` replacement and
//! pruning feed each other (pruning an empty `div` can make two paragraphs
//! adjacent), so they repeat until a round changes nothing. Running
//! [`normalize`] on its own output is therefore a no-op.

use dom_query::NodeRef;
use tracing::trace;

use super::brs::replace_line_breaks;
use super::{
    append_text, child_elements, closest, has_tag, inside_tag, next_element, replace_tag,
    replace_with_text, select_all, trimmed_text, unwrap_node,
};
use crate::extractors::rules::NormalizeRules;

/// Upper bound on merge/replace/prune rounds.
const MAX_ROUNDS: usize = 8;

/// Normalize the subtree under `root` in place.
pub fn normalize(root: &NodeRef, rules: &NormalizeRules) {
    trim_after_property_titles(root, rules);
    remove_nodes(root, rules);
    unwrap_legacy_tags(root, rules);
    replace_style_spans(root, rules);

    for round in 0..MAX_ROUNDS {
        let merged = merge_paragraphs(root, rules);
        let breaks = replace_line_breaks(root, &rules.preformatted_tags);
        let pruned = prune_empty(root, rules);
        trace!(round, merged, breaks, pruned, "normalize round");
        if merged + breaks + pruned == 0 {
            break;
        }
    }
}

fn trim_after_property_titles(root: &NodeRef, rules: &NormalizeRules) {
    for title in select_all(root, &rules.property_title_selector) {
        let Some(next) = title.next_sibling() else {
            continue;
        };
        if !next.is_text() {
            continue;
        }
        let text = next.text();
        let trimmed = text.trim_start();
        if trimmed.len() != text.len() {
            replace_with_text(&next, trimmed);
        }
    }
}

fn remove_nodes(root: &NodeRef, rules: &NormalizeRules) {
    for selector in &rules.remove_selectors {
        for node in select_all(root, selector) {
            node.remove_from_parent();
        }
    }
}

fn unwrap_legacy_tags(root: &NodeRef, rules: &NormalizeRules) {
    for tag in &rules.unwrap_tags {
        for node in select_all(root, tag) {
            unwrap_node(&node);
        }
    }
}

fn replace_style_spans(root: &NodeRef, rules: &NormalizeRules) {
    for rule in &rules.style_spans {
        for span in select_all(root, &format!("span.{}", rule.class)) {
            if inside_tag(&span, &rules.preformatted_tags) {
                continue;
            }
            replace_tag(&span, &rule.tag);
        }
    }
}

/// Short label such as "Input" or anything ending in a colon.
pub fn is_heading_like(text: &str, rules: &NormalizeRules) -> bool {
    let text = text.trim();
    if text.ends_with(':') {
        return true;
    }
    text.chars().count() < rules.heading_max_len
        && rules
            .heading_labels
            .iter()
            .any(|label| label.eq_ignore_ascii_case(text))
}

fn in_sample_test(node: &NodeRef, rules: &NormalizeRules) -> bool {
    closest(node, |n| n.is_element() && n.has_class(&rules.sample_test_class)).is_some()
}

fn should_merge(current: &NodeRef, next: &NodeRef, rules: &NormalizeRules) -> bool {
    if !has_tag(current, &rules.merge_tags) || !has_tag(next, &rules.merge_tags) {
        return false;
    }
    let text = trimmed_text(current);
    let next_text = trimmed_text(next);
    if text.is_empty() || next_text.is_empty() {
        return false;
    }
    if in_sample_test(current, rules) || in_sample_test(next, rules) {
        return false;
    }
    if text.ends_with('.') || text.ends_with('?') {
        return false;
    }
    let ends_with_colon = text.ends_with(':');
    if is_heading_like(&text, rules) && !ends_with_colon {
        return false;
    }
    let starts_sentence = next_text
        .chars()
        .next()
        .map(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .unwrap_or(false);
    ends_with_colon || !starts_sentence
}

/// Merge adjacent paragraph fragments among the element children of `root`.
fn merge_paragraphs(root: &NodeRef, rules: &NormalizeRules) -> usize {
    let mut merged = 0;
    let mut current = child_elements(root).into_iter().next();
    while let Some(node) = current {
        match next_element(&node) {
            Some(next) if should_merge(&node, &next, rules) => {
                append_text(&node, " ");
                for child in next.children() {
                    node.append_child(&child.id);
                }
                next.remove_from_parent();
                merged += 1;
            }
            next => current = next,
        }
    }
    merged
}

/// Remove prunable elements with no text and no image.
fn prune_empty(root: &NodeRef, rules: &NormalizeRules) -> usize {
    let mut pruned = 0;
    for tag in &rules.prune_tags {
        for node in select_all(root, tag) {
            if trimmed_text(&node).is_empty() && select_all(&node, "img").is_empty() {
                node.remove_from_parent();
                pruned += 1;
            }
        }
    }
    pruned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::select_first;
    use crate::extractors::rules::SiteRules;
    use dom_query::Document;
    use pretty_assertions::assert_eq;

    fn rules() -> NormalizeRules {
        SiteRules::default().normalize
    }

    fn normalized(html: &str) -> String {
        let doc = Document::from(format!(r#"<div id="root">{html}</div>"#).as_str());
        let root = select_first(&doc.root(), "#root").unwrap();
        normalize(&root, &rules());
        root.inner_html().to_string()
    }

    #[test]
    fn merges_sentence_split_across_paragraphs() {
        assert_eq!(
            normalized("<p>The first line contains</p><p>an integer n.</p>"),
            "<p>The first line contains an integer n.</p>"
        );
    }

    #[test]
    fn merges_chains_of_fragments() {
        assert_eq!(
            normalized("<p>a</p><p>b</p><div>c</div>"),
            "<p>a b c</p>"
        );
    }

    #[test]
    fn keeps_paragraphs_starting_a_new_sentence() {
        let html = "<p>First part</p><p>Second part</p><p>1 more</p>";
        assert_eq!(normalized(html), html);
    }

    #[test]
    fn colon_label_merges_with_following_sentence() {
        assert_eq!(
            normalized("<p>Input:</p><p>The first line</p>"),
            "<p>Input: The first line</p>"
        );
    }

    #[test]
    fn colonless_heading_is_never_merged() {
        let html = "<p>Note</p><p>in the first sample</p>";
        assert_eq!(normalized(html), html);
    }

    #[test]
    fn terminal_punctuation_blocks_merge() {
        let html = "<p>Done.</p><p>then more</p><p>Why?</p><p>because</p>";
        assert_eq!(normalized(html), html);
    }

    #[test]
    fn sample_tests_are_not_merged() {
        let html = r#"<div class="sample-test">input</div><p>more text</p>"#;
        assert_eq!(normalized(html), html);
    }

    #[test]
    fn heading_detection() {
        let rules = rules();
        assert!(is_heading_like("Output", &rules));
        assert!(is_heading_like("  examples ", &rules));
        assert!(is_heading_like("Constraints:", &rules));
        assert!(!is_heading_like("Output format", &rules));
    }

    #[test]
    fn style_spans_become_semantic_tags_outside_pre() {
        assert_eq!(
            normalized(
                r#"<p><span class="tex-font-style-it">k</span></p><pre><span class="tex-font-style-tt">x</span></pre>"#
            ),
            r#"<p><em>k</em></p><pre><span class="tex-font-style-tt">x</span></pre>"#
        );
    }

    #[test]
    fn removes_previews_and_unwraps_font() {
        assert_eq!(
            normalized(
                r#"<p><span class="MathJax_Preview">$n$</span><font color="red">n</font> is given</p>"#
            ),
            "<p>n is given</p>"
        );
    }

    #[test]
    fn replaces_breaks_outside_pre() {
        assert_eq!(
            normalized("<p>a<br>b</p><pre>1<br>2</pre>"),
            "<p>a b</p><pre>1<br>2</pre>"
        );
    }

    #[test]
    fn prunes_empty_blocks_but_keeps_images() {
        assert_eq!(
            normalized(r#"<p>text</p><div> </div><p><img src="x.png"></p>"#),
            r#"<p>text</p><p><img src="x.png"></p>"#
        );
    }

    #[test]
    fn merges_fragments_made_adjacent_by_pruning() {
        assert_eq!(
            normalized("<p>the value</p><div></div><p>of n</p>"),
            "<p>the value of n</p>"
        );
    }

    #[test]
    fn trims_text_after_property_title() {
        let html = normalized(
            r#"<div class="time-limit"><div class="property-title">time limit per test</div>   2 seconds</div>"#,
        );
        assert!(html.contains("test</div>2 seconds"), "got: {}", html);
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let input = r#"<p>Input:</p><p>a <span class="tex-font-style-bf">bold</span></p><div></div><p>x<br>y</p><p>Note</p><p>lower</p>"#;
        let doc = Document::from(format!(r#"<div id="root">{input}</div>"#).as_str());
        let root = select_first(&doc.root(), "#root").unwrap();
        normalize(&root, &rules());
        let once = root.inner_html().to_string();
        normalize(&root, &rules());
        assert_eq!(root.inner_html().to_string(), once);
    }
}
