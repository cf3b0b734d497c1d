// ABOUTME: Site rule data models: selectors, predicate tables and templates driving every extractor.
// ABOUTME: Heuristics live here as data so they can change without touching the scanning algorithms.

//! Configurable site rules.
//!
//! Everything that ties the pipeline to one site's current markup (container
//! selectors, heading labels, code-title sniffing, anchor patterns) is kept in
//! [`SiteRules`]. The built-in set is embedded JSON (see
//! [`crate::extractors::loader`]); callers may load their own.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::extractors::compiled::get_or_compile_regex;
use crate::result::{Language, ProblemRef};

/// How a [`TextRule`] compares its value against a haystack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Contains,
    StartsWith,
    EndsWith,
    Equals,
    Regex,
}

/// A single string predicate. `value` may contain `{contest}` and `{index}`
/// placeholders, expanded per problem before matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRule {
    pub kind: MatchKind,
    pub value: String,
}

impl TextRule {
    pub fn new(kind: MatchKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// Match without placeholder expansion.
    pub fn matches(&self, haystack: &str) -> bool {
        self.matches_value(&self.value, haystack)
    }

    /// Expand placeholders for `problem` and match. Regex rules get the index
    /// escaped so an index like `B1` cannot inject pattern syntax.
    ///
    /// An expanded regex is specific to one problem, so it is compiled for
    /// this call only and never enters the shared cache.
    pub fn matches_for(&self, problem: &ProblemRef, haystack: &str) -> bool {
        if !self.has_placeholders() {
            return self.matches(haystack);
        }
        let index = match self.kind {
            MatchKind::Regex => regex::escape(&problem.index),
            _ => problem.index.clone(),
        };
        let value = self
            .value
            .replace("{contest}", &problem.contest_id.to_string())
            .replace("{index}", &index);
        match self.kind {
            MatchKind::Regex => Regex::new(&value)
                .map(|re| re.is_match(haystack))
                .unwrap_or(false),
            _ => self.matches_value(&value, haystack),
        }
    }

    fn has_placeholders(&self) -> bool {
        self.value.contains("{contest}") || self.value.contains("{index}")
    }

    fn matches_value(&self, value: &str, haystack: &str) -> bool {
        match self.kind {
            MatchKind::Contains => haystack.contains(value),
            MatchKind::StartsWith => haystack.starts_with(value),
            MatchKind::EndsWith => haystack.ends_with(value),
            MatchKind::Equals => haystack == value,
            MatchKind::Regex => get_or_compile_regex(value)
                .map(|re| re.is_match(haystack))
                .unwrap_or(false),
        }
    }
}

/// Maps a decorative span class to the semantic tag that replaces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleSpanRule {
    pub class: String,
    pub tag: String,
}

/// Rules for the in-place HTML normalizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeRules {
    /// Label nodes whose following text gets its leading whitespace trimmed.
    pub property_title_selector: String,
    /// Nodes removed outright (math typesetting previews).
    #[serde(default)]
    pub remove_selectors: Vec<String>,
    /// Legacy tags unwrapped in place, children kept.
    #[serde(default)]
    pub unwrap_tags: Vec<String>,
    #[serde(default)]
    pub style_spans: Vec<StyleSpanRule>,
    /// Tags whose content is left verbatim by the span and `<br>` passes.
    #[serde(default)]
    pub preformatted_tags: Vec<String>,
    /// Tags considered by the paragraph merge pass.
    #[serde(default)]
    pub merge_tags: Vec<String>,
    /// Class of sample-test containers, never merged.
    pub sample_test_class: String,
    /// Short section labels treated as headings.
    #[serde(default)]
    pub heading_labels: Vec<String>,
    /// Labels at least this long are never heading-like.
    pub heading_max_len: usize,
    /// Tags pruned when they end up without text or images.
    #[serde(default)]
    pub prune_tags: Vec<String>,
}

/// Identifies the link from a problem page to its editorial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorialLinkRule {
    /// Lower-case prefix of the anchor text.
    pub text_prefix: String,
    /// Substring required in the href.
    pub href_contains: String,
}

/// Rules for the statement extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementRules {
    /// Path of the problem page relative to the origin.
    pub page_path: String,
    /// Container selectors tried in order.
    pub selectors: Vec<String>,
    pub sample_pre_selector: String,
    pub sample_line_selector: String,
    pub tutorial_link: TutorialLinkRule,
}

impl StatementRules {
    /// Expand `page_path` for `problem`.
    pub fn page_path_for(&self, problem: &ProblemRef) -> String {
        self.page_path
            .replace("{contest}", &problem.contest_id.to_string())
            .replace("{index}", &problem.index)
    }
}

/// Classes of the collapsible spoiler widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpoilerRule {
    pub class: String,
    pub title_class: String,
    pub content_class: String,
}

/// Classifies a spoiler title as code. Evaluated in order against the
/// lower-cased, trimmed title; the first hit decides the language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeTitleRule {
    pub kind: MatchKind,
    pub value: String,
    pub language: Language,
}

/// Rules for locating and scanning one problem's editorial section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorialRules {
    pub container_selector: String,
    /// Highest-priority anchor predicates, tested against the href.
    #[serde(default)]
    pub anchor_href: Vec<TextRule>,
    /// Fallback anchor predicates, tested against the trimmed link text.
    #[serde(default)]
    pub anchor_text: Vec<TextRule>,
    /// Ancestors of the anchor that start a section.
    #[serde(default)]
    pub section_start_tags: Vec<String>,
    /// Elements that end the scan.
    #[serde(default)]
    pub stop_tags: Vec<String>,
    /// Regexes with `contest` and `index` named groups recognising problem links.
    #[serde(default)]
    pub problem_link_patterns: Vec<String>,
    pub spoiler: SpoilerRule,
    /// Optional nested container inside spoiler content to copy from instead.
    #[serde(default)]
    pub nested_content_selector: Option<String>,
    #[serde(default)]
    pub code_titles: Vec<CodeTitleRule>,
}

impl EditorialRules {
    /// Classify a spoiler title. Returns the language of the first matching rule.
    pub fn code_language(&self, title: &str) -> Option<Language> {
        let title = title.trim().to_lowercase();
        self.code_titles
            .iter()
            .find(|rule| TextRule::new(rule.kind, rule.value.as_str()).matches(&title))
            .map(|rule| rule.language)
    }

    /// Whether `href` is a link to `problem`. A recognised problem link must
    /// carry exactly this index, so `A1` never stands in for `A`; the href
    /// rules then decide. Unrecognised hrefs go to the href rules directly.
    pub fn href_links_to(&self, problem: &ProblemRef, href: &str) -> bool {
        if let Some(target) = self.problem_link(href) {
            if !target.index.eq_ignore_ascii_case(&problem.index) {
                return false;
            }
        }
        self.anchor_href.iter().any(|rule| rule.matches_for(problem, href))
    }

    /// Parse an href into the problem it points at, if any pattern recognises it.
    pub fn problem_link(&self, href: &str) -> Option<ProblemRef> {
        self.problem_link_patterns.iter().find_map(|pattern| {
            let re = get_or_compile_regex(pattern)?;
            let caps = re.captures(href)?;
            let contest_id = caps.name("contest")?.as_str().parse().ok()?;
            let index = caps.name("index")?.as_str().to_string();
            Some(ProblemRef::new(contest_id, index))
        })
    }
}

/// Complete rule set for one site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteRules {
    /// Host the rules were written for, informational only.
    #[serde(default)]
    pub domain: String,
    pub statement: StatementRules,
    pub editorial: EditorialRules,
    pub normalize: NormalizeRules,
}

impl Default for SiteRules {
    fn default() -> Self {
        crate::extractors::loader::load_builtin_rules()
    }
}

impl SiteRules {
    /// All CSS selectors referenced by the rules, for cache warm-up.
    pub fn selectors(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.statement.selectors.iter().map(String::as_str).collect();
        out.push(&self.statement.sample_pre_selector);
        out.push(&self.statement.sample_line_selector);
        out.push(&self.editorial.container_selector);
        out.push(&self.normalize.property_title_selector);
        out.extend(self.normalize.remove_selectors.iter().map(String::as_str));
        if let Some(ref nested) = self.editorial.nested_content_selector {
            out.push(nested);
        }
        out
    }
}
