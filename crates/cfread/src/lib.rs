// ABOUTME: Main library entry point for the cfread problem and editorial extractor.
// ABOUTME: Re-exports the public API: Client, ClientBuilder, ContentBundle, ExtractError, ErrorCode, SiteRules, Options.

//! cfread - fetch a competitive-programming problem and its editorial as clean HTML.
//!
//! Given a contest id and a problem index, the client fetches the problem page,
//! extracts and normalizes the statement, follows the tutorial link, and pulls
//! out the section of the shared editorial that belongs to this problem, split
//! into solution prose and reference code.
//!
//! # Example
//!
//! ```no_run
//! use cfread::{Client, ExtractError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ExtractError> {
//!     let client = Client::builder().build();
//!     let bundle = client.extract(1234, "C").await?;
//!     println!("{}", bundle.solution_html);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod dom;
pub mod error;
pub mod extractors;
pub mod formats;
pub mod options;
pub mod resource;
pub mod result;

pub use crate::client::Client;
pub use crate::error::{ErrorCode, ExtractError};
pub use crate::extractors::loader::{load_builtin_rules, load_rules_from_path, load_rules_from_str};
pub use crate::extractors::rules::SiteRules;
pub use crate::options::{ClientBuilder, ContentType, Options};
pub use crate::result::{
    CodeBlock, ContentBundle, EditorialPayload, Language, Problem, ProblemRef, StatementPayload,
};
