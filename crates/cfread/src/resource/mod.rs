// ABOUTME: Resource handling module for fetching pages through an optional forwarding proxy.
// ABOUTME: Handles hard timeouts by cancellation, content-length limits, and charset decoding.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::debug;

use crate::error::ExtractError;

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// Default hard timeout for one fetch.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);

const OP: &str = "Fetch";

/// Bytes escaped when a target URL is embedded in a proxy URL. Everything
/// except ASCII alphanumerics and `-_.!~*'()`.
const URL_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Options for fetching a resource.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub headers: HashMap<String, String>,
    /// Deadline for headers and body together.
    pub timeout: Duration,
    /// Forwarding proxy template. The percent-encoded target replaces
    /// `{url}` or, without a placeholder, is appended.
    pub proxy: Option<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            headers: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
            proxy: None,
        }
    }
}

/// Result of a successful fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    /// The URL that was asked for, before proxy rewriting.
    pub url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResult {
    /// Decode the body as text, using the content-type charset or detection.
    pub fn text(&self) -> String {
        decode_body(&self.body, self.content_type.as_deref())
    }
}

/// Rewrite `target` to go through `proxy`, if one is configured.
pub fn proxied_url(proxy: Option<&str>, target: &str) -> String {
    let Some(proxy) = proxy.filter(|p| !p.trim().is_empty()) else {
        return target.to_string();
    };
    let encoded = utf8_percent_encode(target, URL_COMPONENT).to_string();
    if proxy.contains("{url}") {
        proxy.replace("{url}", &encoded)
    } else {
        format!("{}{}", proxy, encoded)
    }
}

/// Decode body bytes to a String using charset from content-type header or detection.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}

fn request_error(url: &str, what: &str, err: reqwest::Error) -> ExtractError {
    if err.is_timeout() {
        ExtractError::timeout(url, OP, Some(anyhow::anyhow!("{}: {}", what, err)))
    } else {
        ExtractError::network(url, OP, Some(anyhow::anyhow!("{}: {}", what, err)))
    }
}

/// Fetch a resource from the given URL.
///
/// The whole exchange runs under `opts.timeout`; when it elapses the request
/// future is dropped, which aborts the connection, and the call fails with a
/// timeout error. Non-2xx responses and transport failures are network errors.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
    opts: &FetchOptions,
) -> Result<FetchResult, ExtractError> {
    if url.is_empty() {
        return Err(ExtractError::invalid_url(url, OP, None));
    }

    let parsed_url = url::Url::parse(url).map_err(|e| {
        ExtractError::invalid_url(url, OP, Some(anyhow::anyhow!("invalid URL: {}", e)))
    })?;

    let scheme = parsed_url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ExtractError::invalid_url(
            url,
            OP,
            Some(anyhow::anyhow!("scheme must be http or https")),
        ));
    }

    let request_url = proxied_url(opts.proxy.as_deref(), url);
    debug!(url, request_url = %request_url, timeout_ms = opts.timeout.as_millis() as u64, "fetching");

    match tokio::time::timeout(opts.timeout, fetch_inner(client, url, &request_url, opts)).await {
        Ok(result) => result,
        Err(_) => Err(ExtractError::timeout(
            url,
            OP,
            Some(anyhow::anyhow!(
                "no complete response within {} ms",
                opts.timeout.as_millis()
            )),
        )),
    }
}

async fn fetch_inner(
    client: &reqwest::Client,
    url: &str,
    request_url: &str,
    opts: &FetchOptions,
) -> Result<FetchResult, ExtractError> {
    let mut request = client.get(request_url);
    for (key, value) in &opts.headers {
        request = request.header(key, value);
    }

    let response = request
        .send()
        .await
        .map_err(|e| request_error(url, "request failed", e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ExtractError::network(
            url,
            OP,
            Some(anyhow::anyhow!("HTTP status {}", status.as_u16())),
        ));
    }

    if let Some(len) = response.content_length() {
        if len as usize > MAX_CONTENT_LENGTH {
            return Err(ExtractError::network(
                url,
                OP,
                Some(anyhow::anyhow!("content too large")),
            ));
        }
    }

    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_lowercase());

    let body = response
        .bytes()
        .await
        .map_err(|e| request_error(url, "failed to read body", e))?;

    if body.len() > MAX_CONTENT_LENGTH {
        return Err(ExtractError::network(
            url,
            OP,
            Some(anyhow::anyhow!("content too large")),
        ));
    }

    Ok(FetchResult {
        status: status.as_u16(),
        url: url.to_string(),
        final_url,
        content_type,
        body,
    })
}
