// ABOUTME: Editorial locator and section extractor for shared multi-problem tutorial pages.
// ABOUTME: Finds one problem's anchor, then scans forward collecting prose and code spoilers.

//! Editorial section extraction.
//!
//! A tutorial page covers every problem of a round in one document. The
//! section for a problem begins at the block holding a link (or label) for
//! it and runs until a horizontal rule or the heading of another problem.
//! Between those points the scanner is in one of two states: collecting
//! prose, or (after the first code spoiler) collecting code only.

use anyhow::anyhow;
use dom_query::{Document, NodeRef};
use tracing::debug;
use url::Url;

use crate::dom::normalize::normalize;
use crate::dom::{
    attr, escape_text, has_tag, next_element, select_all, select_first, trimmed_text,
};
use crate::error::ExtractError;
use crate::extractors::rules::{EditorialRules, SiteRules};
use crate::extractors::statement::absolutize_links;
use crate::result::{CodeBlock, CodeCandidate, EditorialPayload, ProblemRef};

const OP: &str = "parse editorial";

/// Class on the container prose is assembled into before normalization.
const SOLUTION_CLASS: &str = "editorial-solution";

/// Extract one problem's solution prose and code from a tutorial page.
pub fn parse_editorial(
    html: &str,
    page_url: &str,
    problem: &ProblemRef,
    origin: &Url,
    rules: &SiteRules,
) -> Result<EditorialPayload, ExtractError> {
    let editorial = &rules.editorial;
    let document = Document::from(html);

    let container = select_first(&document.root(), &editorial.container_selector)
        .ok_or_else(|| {
            ExtractError::parse(page_url, OP, Some(anyhow!("could not find editorial content")))
        })?;

    let section_missing = || {
        ExtractError::section_not_found(
            page_url,
            OP,
            Some(anyhow!(
                "could not find a section for problem {} in the editorial",
                problem.index
            )),
        )
    };
    let anchor = locate_anchor(&container, problem, editorial).ok_or_else(section_missing)?;
    let start = section_start(&anchor, &container, editorial).ok_or_else(section_missing)?;

    let section = SectionScanner::new(problem, editorial).scan(next_element(&start));
    debug!(
        page_url,
        problem = %problem,
        prose = section.prose.len(),
        code = section.candidates.len(),
        "scanned editorial section"
    );

    let solution_html = assemble_prose(&section.prose, problem, origin, rules);
    let code = CodeBlock::from_candidates(&section.candidates, &problem.index);
    Ok(EditorialPayload {
        solution_html,
        code,
    })
}

/// Find the anchor introducing `problem`. Href rules win over text rules;
/// within each tier the first anchor in document order is taken.
pub fn locate_anchor<'a>(
    container: &NodeRef<'a>,
    problem: &ProblemRef,
    rules: &EditorialRules,
) -> Option<NodeRef<'a>> {
    let anchors = select_all(container, "a");

    let by_href = anchors.iter().find(|a| {
        attr(a, "href")
            .map(|href| rules.href_links_to(problem, &href))
            .unwrap_or(false)
    });
    if let Some(anchor) = by_href {
        return Some(*anchor);
    }

    anchors
        .iter()
        .find(|a| {
            let text = trimmed_text(a);
            !text.is_empty() && rules.anchor_text.iter().any(|r| r.matches_for(problem, &text))
        })
        .copied()
}

/// The block the section starts after: the nearest section-start ancestor of
/// the anchor below `container`, else the anchor's top-level ancestor.
fn section_start<'a>(
    anchor: &NodeRef<'a>,
    container: &NodeRef<'a>,
    rules: &EditorialRules,
) -> Option<NodeRef<'a>> {
    let mut current = Some(*anchor);
    let mut top = None;
    while let Some(node) = current {
        if node.id == container.id {
            break;
        }
        if has_tag(&node, &rules.section_start_tags) {
            return Some(node);
        }
        top = Some(node);
        current = node.parent();
    }
    top
}

/// Scanner state. Moves from `Solution` to `Code` once and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Solution,
    Code,
}

/// What the scan collected: prose fragments as HTML and code candidates.
#[derive(Debug, Default)]
struct Section {
    prose: Vec<String>,
    candidates: Vec<CodeCandidate>,
}

struct SectionScanner<'r> {
    problem: &'r ProblemRef,
    rules: &'r EditorialRules,
    state: ScanState,
}

impl<'r> SectionScanner<'r> {
    fn new(problem: &'r ProblemRef, rules: &'r EditorialRules) -> Self {
        Self {
            problem,
            rules,
            state: ScanState::Solution,
        }
    }

    fn scan(mut self, first: Option<NodeRef>) -> Section {
        let mut section = Section::default();
        let mut cursor = first;

        while let Some(node) = cursor {
            if self.ends_section(&node) {
                break;
            }

            let candidate = self.code_candidate(&node);
            if candidate.is_some() && self.state == ScanState::Solution {
                debug!(problem = %self.problem, "code spoiler found, collecting code only");
                self.state = ScanState::Code;
            }

            if self.state == ScanState::Solution {
                section.prose.push(self.prose_fragment(&node));
            }
            if let Some(candidate) = candidate {
                section.candidates.push(candidate);
            }

            cursor = next_element(&node);
        }

        section
    }

    /// A horizontal rule, or a block that opens with a link to another
    /// problem of the same contest.
    fn ends_section(&self, node: &NodeRef) -> bool {
        if has_tag(node, &self.rules.stop_tags) {
            return true;
        }
        let node_text = trimmed_text(node);
        select_all(node, "a").iter().any(|a| {
            let Some(target) = attr(a, "href").and_then(|href| self.rules.problem_link(&href))
            else {
                return false;
            };
            if target.contest_id != self.problem.contest_id || target.same_problem(self.problem) {
                return false;
            }
            let link_text = trimmed_text(a);
            !link_text.is_empty() && node_text.starts_with(&link_text)
        })
    }

    fn is_spoiler(&self, node: &NodeRef) -> bool {
        node.is_element() && node.has_class(&self.rules.spoiler.class)
    }

    fn spoiler_parts<'a>(&self, node: &NodeRef<'a>) -> Option<(NodeRef<'a>, NodeRef<'a>)> {
        let spoiler = &self.rules.spoiler;
        let title = select_first(node, &format!(".{}", spoiler.title_class))?;
        let content = select_first(node, &format!(".{}", spoiler.content_class))?;
        Some((title, content))
    }

    fn code_candidate(&self, node: &NodeRef) -> Option<CodeCandidate> {
        if !self.is_spoiler(node) {
            return None;
        }
        let (title, content) = self.spoiler_parts(node)?;
        let pre = select_first(&content, "pre")?;
        let title = trimmed_text(&title);
        let language = self.rules.code_language(&title)?;
        Some(CodeCandidate {
            title: if title.is_empty() { "Code".to_string() } else { title },
            content: pre.text().to_string(),
            language,
        })
    }

    /// HTML for one prose node. Well-formed spoilers become open `<details>`.
    fn prose_fragment(&self, node: &NodeRef) -> String {
        let parts = if self.is_spoiler(node) {
            self.spoiler_parts(node)
        } else {
            None
        };
        let Some((title, content)) = parts else {
            return node.html().to_string();
        };

        let source = self
            .rules
            .nested_content_selector
            .as_deref()
            .and_then(|selector| select_first(&content, selector))
            .unwrap_or(content);

        format!(
            r#"<details open class="editorial-spoiler"><summary>{}</summary><div class="spoiler-content-wrapper">{}</div></details>"#,
            escape_text(&title.text()),
            source.inner_html()
        )
    }
}

/// Join prose fragments into one container, fix links, normalize, serialize.
fn assemble_prose(
    prose: &[String],
    problem: &ProblemRef,
    origin: &Url,
    rules: &SiteRules,
) -> String {
    let document = Document::from(
        format!(r#"<div class="{}">{}</div>"#, SOLUTION_CLASS, prose.concat()).as_str(),
    );
    let html = match select_first(&document.root(), &format!("div.{}", SOLUTION_CLASS)) {
        Some(container) => {
            absolutize_links(&container, origin);
            normalize(&container, &rules.normalize);
            for wrapper in select_all(&container, ".editorial-spoiler .spoiler-content-wrapper") {
                normalize(&wrapper, &rules.normalize);
            }
            container.inner_html().to_string()
        }
        None => String::new(),
    };

    if html.trim().is_empty() {
        format!(
            "<p>Could not automatically parse the solution text for problem <b>{}</b>. The editorial might use a non-standard format.</p>",
            problem.index
        )
    } else {
        html
    }
}
