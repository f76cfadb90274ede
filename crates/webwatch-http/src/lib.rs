// # HTTP Fetcher
//
// This crate provides the reqwest-backed page fetcher for webwatch.
//
// ## Behavior
//
// - One GET per check, URL used exactly as configured
// - HTTP Basic auth when the site has both a username and a password
// - The status code is ignored: an error page is a body like any other
// - Transport failures (DNS, connect, TLS, timeout, body read) become
//   `Error::Fetch` carrying the URL
//
// ## Timeouts
//
// Without an explicit timeout the client's own defaults apply. The engine
// may additionally bound each check and the whole cycle.

use std::time::Duration;

use tracing::debug;
use webwatch_core::traits::{FetchRequest, Fetcher};
use webwatch_core::{Error, Result};

/// reqwest-backed [`Fetcher`]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    /// HTTP client, shared by every concurrent check
    client: reqwest::Client,

    /// Whole-request timeout, if any
    timeout: Option<Duration>,
}

impl HttpFetcher {
    /// Create a fetcher with the client's default settings
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: None,
        }
    }

    /// Create a fetcher whose requests time out after `timeout`
    ///
    /// # Returns
    ///
    /// - `Ok(HttpFetcher)`
    /// - `Err(Error::Config)`: The HTTP client could not be built
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout: Some(timeout),
        })
    }

    /// Configured request timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<u8>> {
        let mut builder = self.client.get(&request.url);
        if let Some(auth) = &request.credentials {
            builder = builder.basic_auth(&auth.username, Some(&auth.password));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::fetch(format!("Request to {} failed: {}", request.url, e)))?;

        debug!("{} answered {}", request.url, response.status());

        let body = response.bytes().await.map_err(|e| {
            Error::fetch(format!(
                "Failed to read response from {}: {}",
                request.url, e
            ))
        })?;

        Ok(body.to_vec())
    }
}
