// ABOUTME: Data model of the pipeline: ProblemRef, ContentBundle, CodeBlock, stage payloads and Problem.
// ABOUTME: Also holds the placeholder prose and the assembly rules that keep every bundle complete.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dom::escape_text;
use crate::error::ExtractError;
use crate::formats::{html_to_markdown, html_to_text};

/// Solution prose used when the problem page has no editorial link.
pub const NO_EDITORIAL_SOLUTION: &str =
    "<p>No official editorial link found on the problem page.</p>";

/// Code placeholder used when no editorial could be consulted.
pub const NO_EDITORIAL_CODE: &str = "// No official editorial found.";

/// Immutable identity of a problem, e.g. `1234C`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemRef {
    pub contest_id: u32,
    pub index: String,
}

impl ProblemRef {
    pub fn new(contest_id: u32, index: impl Into<String>) -> Self {
        Self {
            contest_id,
            index: index.into(),
        }
    }

    /// True if both refs name the same problem; indexes compare case-insensitively.
    pub fn same_problem(&self, other: &ProblemRef) -> bool {
        self.contest_id == other.contest_id && self.index.eq_ignore_ascii_case(&other.index)
    }
}

impl fmt::Display for ProblemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.contest_id, self.index)
    }
}

/// Error returned when a problem reference string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid problem reference {0:?}: expected a contest id followed by an index, e.g. 1234C")]
pub struct ParseProblemRefError(pub String);

impl FromStr for ProblemRef {
    type Err = ParseProblemRefError;

    /// Accepts `1234C`, `1234/C` and `1234 C`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (digits, rest) = trimmed.split_at(split);
        let index = rest.trim_start_matches(|c: char| c == '/' || c.is_whitespace());

        let contest_id = digits
            .parse::<u32>()
            .map_err(|_| ParseProblemRefError(s.to_string()))?;
        if index.is_empty() || !index.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ParseProblemRefError(s.to_string()));
        }
        Ok(ProblemRef::new(contest_id, index))
    }
}

/// Language of an extracted code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Cpp,
    Python,
    #[default]
    Text,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Language::Cpp => "cpp",
            Language::Python => "python",
            Language::Text => "text",
        };
        write!(f, "{}", s)
    }
}

/// A code block found while scanning an editorial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeCandidate {
    pub title: String,
    pub content: String,
    pub language: Language,
}

/// The reference solution attached to a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CodeBlock {
    pub text: String,
    pub language: Language,
}

impl CodeBlock {
    /// A plain-text placeholder block.
    pub fn placeholder(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: Language::Text,
        }
    }

    /// Join the candidates into one block. The reported language is cpp when
    /// any candidate is cpp, otherwise the first candidate's.
    pub fn from_candidates(candidates: &[CodeCandidate], index: &str) -> Self {
        let Some(first) = candidates.first() else {
            return Self::placeholder(format!("// Could not find code for problem {}.", index));
        };

        let text = candidates
            .iter()
            .map(|c| format!("// Source: {}\n\n{}", c.title, c.content.trim()))
            .collect::<Vec<_>>()
            .join("\n\n// --- End of Code Block ---\n\n");

        let language = if candidates.iter().any(|c| c.language == Language::Cpp) {
            Language::Cpp
        } else {
            first.language
        };

        Self { text, language }
    }
}

/// Output of the statement stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementPayload {
    pub statement_html: String,
    pub tutorial_url: Option<String>,
}

/// Output of the editorial stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorialPayload {
    pub solution_html: String,
    pub code: CodeBlock,
}

/// Everything extracted for one problem. Always structurally complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContentBundle {
    pub statement_html: String,
    pub solution_html: String,
    pub code: CodeBlock,
}

impl ContentBundle {
    /// Combine the stage outputs. `editorial` is `None` when the statement page
    /// had no tutorial link; an editorial error becomes placeholder prose.
    pub fn assemble(
        statement: StatementPayload,
        editorial: Option<Result<EditorialPayload, ExtractError>>,
        problem: &ProblemRef,
    ) -> Self {
        let (solution_html, code) = match editorial {
            None => (
                NO_EDITORIAL_SOLUTION.to_string(),
                CodeBlock::placeholder(NO_EDITORIAL_CODE),
            ),
            Some(Ok(payload)) => (payload.solution_html, payload.code),
            Some(Err(err)) => (
                format!(
                    "<p>Failed to load editorial: Failed to fetch or parse the editorial for {}: {}</p>",
                    problem.index,
                    err.reason()
                ),
                CodeBlock::placeholder(NO_EDITORIAL_CODE),
            ),
        };

        Self {
            statement_html: statement.statement_html,
            solution_html,
            code,
        }
    }

    /// Format the bundle as one HTML fragment with the code in a tagged block.
    pub fn format_html(&self, problem: &ProblemRef) -> String {
        format!(
            "<h1>Problem {}</h1>\n{}\n<h2>Editorial</h2>\n{}\n<h2>Code</h2>\n<pre><code class=\"language-{}\">{}</code></pre>\n",
            problem,
            self.statement_html,
            self.solution_html,
            self.code.language,
            escape_text(&self.code.text)
        )
    }

    /// Format the bundle as a single markdown document.
    pub fn format_markdown(&self, problem: &ProblemRef) -> String {
        format!(
            "# Problem {}\n\n{}\n\n## Editorial\n\n{}\n\n## Code\n\n```{}\n{}\n```\n",
            problem,
            html_to_markdown(&self.statement_html),
            html_to_markdown(&self.solution_html),
            self.code.language,
            self.code.text
        )
    }

    /// Format the bundle as plain text.
    pub fn format_text(&self, problem: &ProblemRef) -> String {
        format!(
            "Problem {}\n\n{}\n\nEditorial\n\n{}\n\nCode\n\n{}\n",
            problem,
            html_to_text(&self.statement_html),
            html_to_text(&self.solution_html),
            self.code.text
        )
    }
}

/// A problem from the public problem-set listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub contest_id: u32,
    pub index: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub points: Option<f64>,
    #[serde(default)]
    pub rating: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Problem {
    pub fn problem_ref(&self) -> ProblemRef {
        ProblemRef::new(self.contest_id, self.index.clone())
    }
}
