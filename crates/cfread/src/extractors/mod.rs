// ABOUTME: Extraction stages for problem pages and tutorial pages.
// ABOUTME: Includes the statement and editorial extractors plus the site rules that drive them.

//! Content extraction module.
//!
//! Submodules:
//! - `statement`: statement container, sample reformatting, tutorial link.
//! - `editorial`: anchor location and the forward section scan.
//! - `rules` / `loader`: site rules as data, embedded or loaded from JSON.
//! - `compiled`: caches for compiled selectors and regexes.

pub mod compiled;
pub mod editorial;
pub mod loader;
pub mod rules;
pub mod statement;
