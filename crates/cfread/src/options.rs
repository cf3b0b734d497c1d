// ABOUTME: Configuration options for the cfread client including ContentType, Options, and ClientBuilder.
// ABOUTME: ClientBuilder provides a fluent API for constructing Client instances with custom settings.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::client::Client;
use crate::extractors::rules::SiteRules;
use crate::resource::DEFAULT_TIMEOUT;

/// Site the pipeline talks to unless told otherwise.
pub const DEFAULT_ORIGIN: &str = "https://codeforces.com";

/// The rendering format for a content bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    Html,
    Markdown,
    Text,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContentType::Html => "html",
            ContentType::Markdown => "markdown",
            ContentType::Text => "text",
        };
        write!(f, "{}", s)
    }
}

impl From<&str> for ContentType {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => ContentType::Markdown,
            "text" | "txt" => ContentType::Text,
            _ => ContentType::Html,
        }
    }
}

/// Configuration options for the cfread client.
#[derive(Debug, Clone)]
pub struct Options {
    /// Hard deadline per fetch.
    pub timeout: Duration,
    pub user_agent: String,
    /// Scheme and host that problem paths and relative links resolve against.
    pub origin: String,
    /// Forwarding proxy template, see [`crate::resource::proxied_url`].
    pub proxy: Option<String>,
    pub http_client: Option<reqwest::Client>,
    pub headers: HashMap<String, String>,
    /// Site rules; the built-in set when `None`.
    pub rules: Option<SiteRules>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("cfread/", env!("CARGO_PKG_VERSION")).to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            proxy: None,
            http_client: None,
            headers: HashMap::new(),
            rules: None,
        }
    }
}

/// Builder for constructing Client instances with custom configuration.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    opts: Options,
}

impl ClientBuilder {
    /// Create a new ClientBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
        }
    }

    /// Set the per-fetch timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Set the site origin, e.g. a mirror.
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.opts.origin = origin.into();
        self
    }

    /// Route page fetches through a forwarding proxy.
    pub fn proxy(mut self, template: impl Into<String>) -> Self {
        self.opts.proxy = Some(template.into());
        self
    }

    /// Use a custom HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Replace the built-in site rules.
    pub fn rules(mut self, rules: SiteRules) -> Self {
        self.opts.rules = Some(rules);
        self
    }

    /// Build the Client with the configured options.
    pub fn build(self) -> Client {
        Client::new(self.opts)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_from_str() {
        assert_eq!(ContentType::from("md"), ContentType::Markdown);
        assert_eq!(ContentType::from("TEXT"), ContentType::Text);
        assert_eq!(ContentType::from("anything"), ContentType::Html);
        assert_eq!(ContentType::Markdown.to_string(), "markdown");
    }

    #[test]
    fn defaults() {
        let opts = Options::default();
        assert_eq!(opts.timeout, Duration::from_millis(15_000));
        assert_eq!(opts.origin, "https://codeforces.com");
        assert!(opts.proxy.is_none());
        assert!(opts.user_agent.starts_with("cfread/"));
    }
}
