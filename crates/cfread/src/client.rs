// ABOUTME: The main Client struct for cfread that fetches problem pages and tutorials and runs the extractors.
// ABOUTME: Provides extract() for a full content bundle plus statement, editorial, batch and problem-list calls.

use anyhow::anyhow;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::ExtractError;
use crate::extractors::editorial::parse_editorial;
use crate::extractors::loader::load_builtin_rules;
use crate::extractors::rules::SiteRules;
use crate::extractors::statement::parse_statement;
use crate::options::{ClientBuilder, Options};
use crate::resource::{fetch, FetchOptions};
use crate::result::{ContentBundle, EditorialPayload, Problem, ProblemRef, StatementPayload};

/// Path of the public problem-set listing, relative to the origin.
const PROBLEMSET_API_PATH: &str = "/api/problemset.problems";

#[derive(Debug, Deserialize)]
struct ProblemsetResponse {
    status: String,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    result: Option<ProblemsetResult>,
}

#[derive(Debug, Deserialize)]
struct ProblemsetResult {
    problems: Vec<Problem>,
}

/// The main cfread client.
///
/// Cheap to share: every method takes `&self` and the underlying
/// `reqwest::Client` pools connections.
pub struct Client {
    opts: Options,
    http_client: reqwest::Client,
    rules: SiteRules,
}

impl Client {
    /// Create a new ClientBuilder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a new Client with the given options.
    pub fn new(opts: Options) -> Self {
        let http_client = opts.http_client.clone().unwrap_or_else(|| {
            reqwest::Client::builder()
                .user_agent(&opts.user_agent)
                .cookie_store(true)
                .gzip(true)
                .brotli(true)
                .deflate(true)
                .build()
                .expect("failed to build HTTP client")
        });

        let rules = opts.rules.clone().unwrap_or_else(load_builtin_rules);

        Self {
            opts,
            http_client,
            rules,
        }
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    pub fn rules(&self) -> &SiteRules {
        &self.rules
    }

    fn origin(&self) -> Result<Url, ExtractError> {
        Url::parse(&self.opts.origin).map_err(|e| {
            ExtractError::invalid_url(
                &self.opts.origin,
                "Origin",
                Some(anyhow!("invalid origin: {}", e)),
            )
        })
    }

    fn join(&self, origin: &Url, path: &str) -> Result<String, ExtractError> {
        origin.join(path).map(String::from).map_err(|e| {
            ExtractError::invalid_url(path, "Join", Some(anyhow!("cannot resolve path: {}", e)))
        })
    }

    /// Absolute URL of the problem page.
    pub fn problem_url(&self, problem: &ProblemRef) -> Result<String, ExtractError> {
        let origin = self.origin()?;
        self.join(&origin, &self.rules.statement.page_path_for(problem))
    }

    fn fetch_options(&self, proxy: Option<String>) -> FetchOptions {
        FetchOptions {
            headers: self.opts.headers.clone(),
            timeout: self.opts.timeout,
            proxy,
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<String, ExtractError> {
        let opts = self.fetch_options(self.opts.proxy.clone());
        let result = fetch(&self.http_client, url, &opts).await?;
        Ok(result.text())
    }

    /// Fetch a problem page and extract its statement and tutorial link.
    pub async fn extract_statement(
        &self,
        contest_id: u32,
        index: &str,
    ) -> Result<StatementPayload, ExtractError> {
        self.statement_for(&ProblemRef::new(contest_id, index)).await
    }

    async fn statement_for(&self, problem: &ProblemRef) -> Result<StatementPayload, ExtractError> {
        let origin = self.origin()?;
        let url = self.problem_url(problem)?;
        debug!(problem = %problem, url = %url, "statement stage");
        let html = self.fetch_page(&url).await?;
        parse_statement(&html, &url, &origin, &self.rules)
    }

    /// Fetch a tutorial page and extract the section for one problem.
    pub async fn extract_editorial(
        &self,
        tutorial_url: &str,
        contest_id: u32,
        index: &str,
    ) -> Result<EditorialPayload, ExtractError> {
        self.editorial_for(tutorial_url, &ProblemRef::new(contest_id, index))
            .await
    }

    async fn editorial_for(
        &self,
        tutorial_url: &str,
        problem: &ProblemRef,
    ) -> Result<EditorialPayload, ExtractError> {
        let origin = self.origin()?;
        debug!(problem = %problem, url = tutorial_url, "editorial stage");
        let html = self.fetch_page(tutorial_url).await?;
        parse_editorial(&html, tutorial_url, problem, &origin, &self.rules)
    }

    /// Extract the full content bundle for a problem.
    ///
    /// Statement failures are returned as the error. Editorial failures never
    /// are: they become placeholder prose in the bundle.
    pub async fn extract(&self, contest_id: u32, index: &str) -> Result<ContentBundle, ExtractError> {
        self.extract_problem(&ProblemRef::new(contest_id, index))
            .await
    }

    /// [`Client::extract`] for an already-built reference.
    pub async fn extract_problem(&self, problem: &ProblemRef) -> Result<ContentBundle, ExtractError> {
        let statement = self.statement_for(problem).await?;

        let editorial = match statement.tutorial_url.as_deref() {
            Some(url) => {
                let result = self.editorial_for(url, problem).await;
                if let Err(ref err) = result {
                    warn!(problem = %problem, error = %err, "editorial unavailable, using placeholder");
                }
                Some(result)
            }
            None => {
                debug!(problem = %problem, "no tutorial link on problem page");
                None
            }
        };

        Ok(ContentBundle::assemble(statement, editorial, problem))
    }

    /// Extract several problems with at most `concurrency` in flight.
    /// Results come back in input order.
    pub async fn extract_many(
        &self,
        problems: &[ProblemRef],
        concurrency: usize,
    ) -> Vec<Result<ContentBundle, ExtractError>> {
        let mut results: Vec<(usize, Result<ContentBundle, ExtractError>)> =
            stream::iter(problems.iter().enumerate())
                .map(|(i, problem)| async move { (i, self.extract_problem(problem).await) })
                .buffer_unordered(concurrency.max(1))
                .collect()
                .await;
        results.sort_by_key(|(i, _)| *i);

        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        info!(total = results.len(), failed, "batch extraction finished");

        results.into_iter().map(|(_, r)| r).collect()
    }

    /// Rated problems from the public problem-set listing, newest contest first.
    ///
    /// The API is queried directly, never through the proxy.
    pub async fn fetch_problems(&self) -> Result<Vec<Problem>, ExtractError> {
        let origin = self.origin()?;
        let url = self.join(&origin, PROBLEMSET_API_PATH)?;
        let result = fetch(&self.http_client, &url, &self.fetch_options(None)).await?;

        let response: ProblemsetResponse = serde_json::from_slice(&result.body).map_err(|e| {
            ExtractError::parse(&url, "Problems", Some(anyhow!("invalid API response: {}", e)))
        })?;
        if response.status != "OK" {
            let comment = response.comment.unwrap_or_else(|| response.status.clone());
            return Err(ExtractError::parse(
                &url,
                "Problems",
                Some(anyhow!("API returned an error: {}", comment)),
            ));
        }

        let mut problems: Vec<Problem> = response
            .result
            .map(|r| r.problems)
            .unwrap_or_default()
            .into_iter()
            .filter(|p| p.rating.is_some())
            .collect();
        problems.sort_by(|a, b| b.contest_id.cmp(&a.contest_id));
        debug!(count = problems.len(), "fetched problem list");
        Ok(problems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;

    fn client_for(server: &MockServer) -> Client {
        Client::builder().origin(server.base_url()).build()
    }

    #[test]
    fn problem_url_uses_origin_and_page_path() {
        let client = Client::builder().build();
        assert_eq!(
            client.problem_url(&ProblemRef::new(1234, "C")).unwrap(),
            "https://codeforces.com/problemset/problem/1234/C"
        );
    }

    #[test]
    fn invalid_origin_is_reported() {
        let client = Client::builder().origin("not an origin").build();
        let err = client.problem_url(&ProblemRef::new(1, "A")).unwrap_err();
        assert!(err.is_invalid_url());
    }

    #[tokio::test]
    async fn statement_stage_reads_problem_page() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/problemset/problem/4/A");
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .body(r#"<div class="problem-statement"><p>Statement body</p></div>"#);
        });

        let payload = client_for(&server).extract_statement(4, "A").await.unwrap();
        mock.assert();
        assert_eq!(payload.statement_html, "<p>Statement body</p>");
        assert_eq!(payload.tutorial_url, None);
    }

    #[tokio::test]
    async fn fetch_problems_keeps_rated_sorted_by_contest() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/problemset.problems");
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    r#"{"status":"OK","result":{"problems":[
                        {"contestId":100,"index":"A","name":"Old","type":"PROGRAMMING","rating":800,"tags":["math"]},
                        {"contestId":300,"index":"B","name":"Unrated","type":"PROGRAMMING","tags":[]},
                        {"contestId":200,"index":"C","name":"New","type":"PROGRAMMING","points":1500.0,"rating":1600,"tags":[]}
                    ],"problemStatistics":[]}}"#,
                );
        });

        let problems = client_for(&server).fetch_problems().await.unwrap();
        let names: Vec<&str> = problems.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["New", "Old"]);
        assert_eq!(problems[0].problem_ref(), ProblemRef::new(200, "C"));
        assert_eq!(problems[0].points, Some(1500.0));
    }

    #[tokio::test]
    async fn fetch_problems_rejects_failed_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/problemset.problems");
            then.status(200)
                .body(r#"{"status":"FAILED","comment":"Call limit exceeded"}"#);
        });

        let err = client_for(&server).fetch_problems().await.unwrap_err();
        assert!(err.is_parse());
        assert!(err.reason().contains("Call limit exceeded"));
    }

    #[tokio::test]
    async fn fetch_problems_bypasses_proxy() {
        let server = MockServer::start();
        let api = server.mock(|when, then| {
            when.method(GET).path("/api/problemset.problems");
            then.status(200)
                .body(r#"{"status":"OK","result":{"problems":[]}}"#);
        });

        let client = Client::builder()
            .origin(server.base_url())
            .proxy("http://127.0.0.1:1/?url=")
            .build();
        let problems = client.fetch_problems().await.unwrap();
        api.assert();
        assert!(problems.is_empty());
    }
}
