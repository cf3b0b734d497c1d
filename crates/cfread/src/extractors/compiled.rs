// ABOUTME: Pre-compiled CSS selector and regex caches shared by every extraction.
// ABOUTME: Rules are stored as strings; this module compiles each pattern once and hands out clones.

//! Pattern caching for efficient repeated DOM queries.
//!
//! Site rules keep their selectors and regexes as plain strings so they can be
//! loaded from JSON. Compiling them is expensive relative to matching, so this
//! module compiles each distinct pattern once and reuses it for all later
//! queries. Invalid patterns are cached as `None` and never match.

use std::collections::HashMap;
use std::sync::RwLock;

use dom_query::Matcher;
use once_cell::sync::Lazy;
use regex::Regex;

/// Thread-safe cache of compiled CSS selectors.
static SELECTOR_CACHE: Lazy<RwLock<HashMap<String, Option<Matcher>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Thread-safe cache of compiled regexes.
static REGEX_CACHE: Lazy<RwLock<HashMap<String, Option<Regex>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

fn cached<T, F>(cache: &RwLock<HashMap<String, Option<T>>>, key: &str, compile: F) -> Option<T>
where
    T: Clone,
    F: FnOnce(&str) -> Option<T>,
{
    // Shared lock for hits. Poisoned locks are recovered.
    {
        let map = cache.read().unwrap_or_else(|e| e.into_inner());
        if let Some(hit) = map.get(key) {
            return hit.clone();
        }
    }

    let compiled = compile(key);
    let mut map = cache.write().unwrap_or_else(|e| e.into_inner());
    map.entry(key.to_string())
        .or_insert_with(|| compiled.clone())
        .clone()
}

/// Gets or compiles a CSS selector, caching the result.
///
/// Returns `Some(Matcher)` if the selector is valid, `None` if invalid.
pub fn get_or_compile(css: &str) -> Option<Matcher> {
    cached(&SELECTOR_CACHE, css, |s| Matcher::new(s).ok())
}

/// Gets or compiles a regex, caching the result.
///
/// Returns `None` for invalid patterns.
pub fn get_or_compile_regex(pattern: &str) -> Option<Regex> {
    cached(&REGEX_CACHE, pattern, |p| Regex::new(p).ok())
}

#[cfg(test)]
pub(crate) fn is_regex_cached(pattern: &str) -> bool {
    REGEX_CACHE
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .contains_key(pattern)
}

/// Precompiles a batch of selectors into the cache.
///
/// Called after rules are loaded to surface lock contention at startup rather
/// than during extraction.
pub fn precompile_selectors<I, S>(selectors: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for css in selectors {
        let _ = get_or_compile(css.as_ref());
    }
}
