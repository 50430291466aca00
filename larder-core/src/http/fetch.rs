//! Page fetching: the trait the orchestrator consumes, the reqwest-backed
//! implementation and a mock for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

use super::charset::decode_bytes_to_utf8;
use crate::error::FetchError;

/// Largest body we are willing to read.
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Media types worth handing to the page extractor.
pub const ACCEPTED_CONTENT_TYPES: &[&str] = &["text/html", "application/xhtml+xml", "text/plain"];

const USER_AGENT: &str = "Mozilla/5.0 (compatible; Larder/0.1; recipe import)";

/// A fetched, decoded text document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContent {
    pub body: String,
    /// Media type without parameters, lowercased.
    pub content_type: String,
}

/// Trait for page fetchers, enabling mockability in tests.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch a URL that has already passed the SSRF guard. `resolved` holds
    /// the addresses the guard checked; when non-empty the connection must go
    /// to one of them.
    async fn fetch(
        &self,
        url: &Url,
        resolved: &[SocketAddr],
    ) -> Result<FetchedContent, FetchError>;
}

/// "text/html; charset=utf-8" -> "text/html"
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

pub fn is_accepted_content_type(media_type: &str) -> bool {
    ACCEPTED_CONTENT_TYPES.contains(&media_type)
}

/// Production fetcher.
///
/// Redirects are not followed: the redirect target never went through the
/// guard. A host the guard resolved is connected to at the checked addresses,
/// never looked up a second time.
pub struct ReqwestFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_bytes: usize,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: Self::builder(timeout).build()?,
            timeout,
            max_bytes: MAX_BODY_BYTES,
        })
    }

    fn builder(timeout: Duration) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
    }

    /// Client bound to `resolved` for the URL's domain. IP literals and
    /// unresolved hosts use the shared client.
    fn client_for(
        &self,
        url: &Url,
        resolved: &[SocketAddr],
    ) -> Result<reqwest::Client, FetchError> {
        match url.domain() {
            Some(domain) if !resolved.is_empty() => {
                tracing::debug!(domain, addrs = ?resolved, "network: pinning resolved addresses");
                // a proxy would resolve the name itself
                Ok(Self::builder(self.timeout)
                    .no_proxy()
                    .resolve_to_addrs(domain, resolved)
                    .build()?)
            }
            _ => Ok(self.client.clone()),
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

#[async_trait]
impl ContentFetcher for ReqwestFetcher {
    async fn fetch(
        &self,
        url: &Url,
        resolved: &[SocketAddr],
    ) -> Result<FetchedContent, FetchError> {
        tracing::debug!(url = %url, "network: fetching page");
        let client = self.client_for(url, resolved)?;
        let mut response = client.get(url.clone()).send().await?;

        let status = response.status();
        if status.is_redirection() {
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown location")
                .to_string();
            return Err(FetchError::Redirected(location));
        }
        if !status.is_success() {
            tracing::debug!(url = %url, status = %status, "network: request failed");
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let raw_content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let content_type = raw_content_type
            .as_deref()
            .map(media_type)
            .unwrap_or_default();
        if !is_accepted_content_type(&content_type) {
            let shown = if content_type.is_empty() {
                "none".to_string()
            } else {
                content_type
            };
            return Err(FetchError::UnsupportedContentType(shown));
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes as u64)
        {
            return Err(FetchError::TooLarge {
                limit: self.max_bytes,
            });
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(FetchError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            bytes.extend_from_slice(&chunk);
        }

        tracing::debug!(url = %url, bytes = bytes.len(), "network: fetched successfully");
        Ok(FetchedContent {
            body: decode_bytes_to_utf8(&bytes, raw_content_type.as_deref()),
            content_type,
        })
    }
}

/// Mock response for testing.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Html(String),
    Status(u16),
    ContentType(String),
    Error(String),
}

/// Mock fetcher for testing.
#[derive(Debug, Default)]
pub struct MockFetcher {
    responses: HashMap<String, MockResponse>,
    delay: Option<Duration>,
    pinned: Mutex<Vec<Vec<SocketAddr>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, url: &str, response: MockResponse) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    pub fn with_html(self, url: &str, html: &str) -> Self {
        self.with_response(url, MockResponse::Html(html.to_string()))
    }

    pub fn with_error(self, url: &str, error: &str) -> Self {
        self.with_response(url, MockResponse::Error(error.to_string()))
    }

    /// Sleep before answering, for exercising timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// The `resolved` argument of every fetch so far.
    pub fn pinned_addrs(&self) -> Vec<Vec<SocketAddr>> {
        self.pinned.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentFetcher for MockFetcher {
    async fn fetch(
        &self,
        url: &Url,
        resolved: &[SocketAddr],
    ) -> Result<FetchedContent, FetchError> {
        self.pinned.lock().unwrap().push(resolved.to_vec());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.responses.get(url.as_str()) {
            Some(MockResponse::Html(html)) => Ok(FetchedContent {
                body: html.clone(),
                content_type: "text/html".to_string(),
            }),
            Some(MockResponse::Status(status)) => Err(FetchError::HttpStatus(*status)),
            Some(MockResponse::ContentType(content_type)) => {
                Err(FetchError::UnsupportedContentType(media_type(content_type)))
            }
            Some(MockResponse::Error(e)) => Err(FetchError::InvalidUrl(e.clone())),
            None => Err(FetchError::InvalidUrl(format!(
                "No mock response for URL: {}",
                url
            ))),
        }
    }
}
