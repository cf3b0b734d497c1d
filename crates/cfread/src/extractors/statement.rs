// ABOUTME: Statement extraction from a fetched problem page.
// ABOUTME: Locates the statement container, fixes links and samples, normalizes, finds the tutorial link.

use anyhow::anyhow;
use dom_query::{Document, NodeRef};
use tracing::debug;
use url::Url;

use crate::dom::normalize::normalize;
use crate::dom::{attr, select_all, select_first, set_text_content};
use crate::error::ExtractError;
use crate::extractors::rules::{SiteRules, StatementRules, TutorialLinkRule};
use crate::result::StatementPayload;

const OP: &str = "parse statement";

/// Extract the statement and tutorial link from a problem page.
///
/// Network-free; `page_url` is used for error reporting only and `origin`
/// is the base for relative links.
pub fn parse_statement(
    html: &str,
    page_url: &str,
    origin: &Url,
    rules: &SiteRules,
) -> Result<StatementPayload, ExtractError> {
    let document = Document::from(html);
    let root = document.root();

    let container = rules
        .statement
        .selectors
        .iter()
        .find_map(|selector| select_first(&root, selector))
        .ok_or_else(|| {
            ExtractError::parse(
                page_url,
                OP,
                Some(anyhow!("could not find problem statement")),
            )
        })?;

    absolutize_links(&container, origin);
    let samples = reformat_samples(&container, &rules.statement);
    normalize(&container, &rules.normalize);

    let statement_html = container.inner_html().to_string();
    if statement_html.trim().is_empty() {
        return Err(ExtractError::parse(
            page_url,
            OP,
            Some(anyhow!("problem statement is empty")),
        ));
    }

    let tutorial_url = find_tutorial_url(&root, origin, &rules.statement.tutorial_link);
    debug!(page_url, samples, tutorial = ?tutorial_url, "parsed statement");

    Ok(StatementPayload {
        statement_html,
        tutorial_url,
    })
}

/// Rewrite relative `a[href]` and `img[src]` values against `origin`.
///
/// Absolute URLs and fragment-only links are left alone.
pub fn absolutize_links(root: &NodeRef, origin: &Url) {
    for (selector, name) in [("a[href]", "href"), ("img[src]", "src")] {
        for node in select_all(root, selector) {
            let Some(value) = attr(&node, name) else {
                continue;
            };
            if value.starts_with('#') || Url::parse(&value).is_ok() {
                continue;
            }
            if let Ok(resolved) = origin.join(&value) {
                node.set_attr(name, resolved.as_str());
            }
        }
    }
}

/// Flatten per-line sample markup into newline-joined text. Returns the
/// number of blocks rewritten.
fn reformat_samples(root: &NodeRef, rules: &StatementRules) -> usize {
    let mut rewritten = 0;
    for pre in select_all(root, &rules.sample_pre_selector) {
        let lines = select_all(&pre, &rules.sample_line_selector);
        if lines.is_empty() {
            continue;
        }
        let text = lines
            .iter()
            .map(|line| line.text().trim_end_matches(['\r', '\n']).to_string())
            .collect::<Vec<_>>()
            .join("\n");
        set_text_content(&pre, &text);
        rewritten += 1;
    }
    rewritten
}

/// First anchor on the page that links to the editorial.
pub fn find_tutorial_url(root: &NodeRef, origin: &Url, rule: &TutorialLinkRule) -> Option<String> {
    select_all(root, "a").iter().find_map(|a| {
        let text = a.text().trim().to_lowercase();
        if !text.starts_with(&rule.text_prefix) {
            return None;
        }
        let href = attr(a, "href")?;
        if !href.contains(&rule.href_contains) {
            return None;
        }
        origin.join(&href).ok().map(String::from)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE_URL: &str = "https://codeforces.com/problemset/problem/4/A";

    fn origin() -> Url {
        Url::parse("https://codeforces.com").unwrap()
    }

    fn parse(html: &str) -> Result<StatementPayload, ExtractError> {
        parse_statement(html, PAGE_URL, &origin(), &SiteRules::default())
    }

    const PROBLEM_PAGE: &str = r#"<html><body>
<div id="sidebar">
  <a href="/blog/entry/4"> Tutorial (en)</a>
</div>
<div class="problem-statement">
  <div class="header"><div class="title">A. Watermelon</div></div>
  <div><p>Pete bought a <span class="tex-font-style-bf">watermelon</span>, see <a href="/contest/4/problem/B">this</a>.</p>
  <p><img src="/predownloaded/w.png"></p></div>
  <div class="sample-tests"><div class="sample-test">
    <div class="input"><pre><div class="test-example-line test-example-line-0">8</div><div class="test-example-line test-example-line-1">1 2</div></pre></div>
  </div></div>
</div>
</body></html>"#;

    #[test]
    fn extracts_statement_and_tutorial() {
        let payload = parse(PROBLEM_PAGE).unwrap();
        assert!(payload.statement_html.contains("<strong>watermelon</strong>"));
        assert!(payload
            .statement_html
            .contains(r#"href="https://codeforces.com/contest/4/problem/B""#));
        assert!(payload
            .statement_html
            .contains(r#"src="https://codeforces.com/predownloaded/w.png""#));
        assert!(payload.statement_html.contains("<pre>8\n1 2</pre>"));
        assert!(!payload.statement_html.contains("sidebar"));
        assert_eq!(
            payload.tutorial_url.as_deref(),
            Some("https://codeforces.com/blog/entry/4")
        );
    }

    #[test]
    fn falls_back_to_problem_material() {
        let html = r#"<div class="problem-material"><p>PDF statement</p></div>"#;
        let payload = parse(html).unwrap();
        assert_eq!(payload.statement_html, "<p>PDF statement</p>");
        assert_eq!(payload.tutorial_url, None);
    }

    #[test]
    fn missing_container_is_a_parse_error() {
        let err = parse("<div class='other'>nothing</div>").unwrap_err();
        assert!(err.is_parse());
        assert_eq!(err.reason(), "could not find problem statement");
    }

    #[test]
    fn empty_container_is_a_parse_error() {
        let err = parse(r#"<div class="problem-statement"><div> </div><p></p></div>"#).unwrap_err();
        assert!(err.is_parse());
        assert_eq!(err.reason(), "problem statement is empty");
    }

    #[test]
    fn leaves_absolute_and_fragment_links() {
        let doc = Document::from(
            r##"<div id="c"><a href="https://example.com/x">x</a><a href="#note">n</a><a href="rel/y">y</a></div>"##,
        );
        let root = select_first(&doc.root(), "#c").unwrap();
        absolutize_links(&root, &origin());
        let hrefs: Vec<String> = select_all(&root, "a")
            .iter()
            .filter_map(|a| attr(a, "href"))
            .collect();
        assert_eq!(
            hrefs,
            vec![
                "https://example.com/x".to_string(),
                "#note".to_string(),
                "https://codeforces.com/rel/y".to_string(),
            ]
        );
    }

    #[test]
    fn tutorial_link_requires_blog_entry_href() {
        let doc = Document::from(
            r#"<a href="/contest/4/standings">Tutorial</a><a href="/blog/entry/7">Announcement</a>"#,
        );
        let rule = SiteRules::default().statement.tutorial_link;
        assert_eq!(find_tutorial_url(&doc.root(), &origin(), &rule), None);
    }
}
