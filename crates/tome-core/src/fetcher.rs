use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use crate::config::{FetchConfig, SiteConfig};
use crate::{Error, Result};

/// Cookie that gets past the archive's age gate.
const AGE_COOKIE: &str = "AGE_CONFIRMED=yes";

/// Source of page markup, abstracted so resolution can run against fixtures.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return its body, or a permanent failure.
    ///
    /// Transient "come back later" answers are retried inside the fetcher.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// How "come back later" (HTTP 421) responses are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Fixed wait between attempts.
    pub delay: Duration,
    /// Retries allowed after the first attempt; `None` retries forever.
    pub max_retries: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
            max_retries: Some(12),
        }
    }
}

/// HTTP fetcher for archive pages
pub struct HttpFetcher {
    client: Client,
    retry: RetryPolicy,
    age_cookie: bool,
}

impl HttpFetcher {
    /// Creates a fetcher with default timeout and retry policy
    pub fn new() -> Result<Self> {
        Self::with_options(Duration::from_secs(30), RetryPolicy::default(), true)
    }

    /// Creates a fetcher from the `[fetch]` and `[site]` configuration tables
    pub fn from_config(fetch: &FetchConfig, site: &SiteConfig) -> Result<Self> {
        Self::with_options(
            Duration::from_secs(fetch.timeout_secs),
            fetch.retry_policy(),
            site.age_cookie,
        )
    }

    /// Creates a fetcher with explicit settings (primarily for tests)
    pub fn with_options(timeout: Duration, retry: RetryPolicy, age_cookie: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tome/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self {
            client,
            retry,
            age_cookie,
        })
    }

    /// The retry policy in effect.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let mut retries = 0u32;
        loop {
            let mut request = self.client.get(url);
            if self.age_cookie {
                request = request.header(COOKIE, AGE_COOKIE);
            }

            let response = request.send().await.map_err(|e| {
                warn!(%url, error = %e, "Request failed");
                Error::Network(e)
            })?;
            let status = response.status();

            if status.is_success() {
                let content = response.text().await.map_err(|e| {
                    warn!(%url, error = %e, "Failed to read response body");
                    Error::Network(e)
                })?;
                info!("Fetched {} bytes from {}", content.len(), url);
                return Ok(content);
            }

            if status == StatusCode::MISDIRECTED_REQUEST {
                if self.retry.max_retries.is_some_and(|max| retries >= max) {
                    warn!(%url, retries, "Giving up after repeated 421 responses");
                    return Err(Error::FetchFailed {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }
                retries += 1;
                debug!(%url, retries, delay = ?self.retry.delay, "Server asked to come back later");
                tokio::time::sleep(self.retry.delay).await;
                continue;
            }

            warn!(%url, status = status.as_u16(), "Failed to fetch page");
            return Err(Error::FetchFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
    }
}

// Note: Default is not implemented as HttpFetcher::new() can fail.
