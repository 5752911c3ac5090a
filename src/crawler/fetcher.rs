//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler:
//! - Building the HTTP client with the identifying user agent
//! - GET requests returning page markup
//! - Error classification into [`FetchCause`]
//!
//! There is no retry here; the coordinator owns retry policy.

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::{FetchCause, FetchError};
use reqwest::Client;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use herbar::config::{CrawlerConfig, UserAgentConfig};
/// use herbar::crawler::build_http_client;
///
/// let client =
///     build_http_client(&UserAgentConfig::default(), &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL)
    Client::builder()
        .user_agent(user_agent.signature())
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches raw markup over HTTP
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Creates a fetcher identifying itself with `user_agent`
    pub fn new(user_agent: &UserAgentConfig, crawler: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(user_agent, crawler)?,
        })
    }

    /// Wraps an already configured client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetches `url` and returns its body
    ///
    /// # Errors
    ///
    /// | Condition | Cause |
    /// |-----------|-------|
    /// | Non-2xx status | `Status(code)` |
    /// | Timeout | `Timeout` |
    /// | Connection refused / DNS / TLS | `Connect` |
    /// | Other transport error | `Network` |
    /// | Body could not be read | `Body` |
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.send(url, None).await
    }

    /// Like [`fetch`](Self::fetch) with a request-specific timeout
    pub async fn fetch_with_timeout(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<String, FetchError> {
        self.send(url, Some(timeout)).await
    }

    async fn send(&self, url: &str, timeout: Option<Duration>) -> Result<String, FetchError> {
        let mut request = self.client.get(url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::new(url, classify(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(url, FetchCause::Status(status.as_u16())));
        }

        response.text().await.map_err(|e| {
            let cause = if e.is_timeout() {
                FetchCause::Timeout
            } else {
                FetchCause::Body(e.to_string())
            };
            FetchError::new(url, cause)
        })
    }
}

fn classify(error: &reqwest::Error) -> FetchCause {
    if error.is_timeout() {
        FetchCause::Timeout
    } else if error.is_connect() {
        FetchCause::Connect(error.to_string())
    } else {
        FetchCause::Network(error.to_string())
    }
}
