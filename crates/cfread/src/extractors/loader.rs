// ABOUTME: Loader for site rules from embedded JSON or a user-supplied file.
// ABOUTME: Provides load_builtin_rules() for the default SiteRules and load_rules_from_path() for overrides.

//! Site rule loading.
//!
//! The built-in rules are compiled into the binary so the pipeline works with
//! no configuration; a JSON file with the same shape replaces them wholesale.

use std::fs;
use std::path::Path;

use anyhow::Context;

use crate::extractors::compiled::precompile_selectors;
use crate::extractors::rules::SiteRules;

/// Embedded JSON containing the rules for the default site.
const BUILTIN_RULES_JSON: &str = include_str!("../../data/codeforces_rules.json");

/// Loads the builtin site rules from embedded JSON.
///
/// # Panics
///
/// Panics if the embedded JSON is malformed or cannot be deserialized.
pub fn load_builtin_rules() -> SiteRules {
    let rules: SiteRules =
        serde_json::from_str(BUILTIN_RULES_JSON).expect("failed to parse builtin rules");
    precompile_selectors(rules.selectors());
    rules
}

/// Parses site rules from a JSON string.
pub fn load_rules_from_str(json: &str) -> anyhow::Result<SiteRules> {
    let rules: SiteRules = serde_json::from_str(json).context("invalid site rules JSON")?;
    precompile_selectors(rules.selectors());
    Ok(rules)
}

/// Reads and parses site rules from a JSON file.
pub fn load_rules_from_path(path: impl AsRef<Path>) -> anyhow::Result<SiteRules> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read rules file {}", path.display()))?;
    load_rules_from_str(&json)
}
