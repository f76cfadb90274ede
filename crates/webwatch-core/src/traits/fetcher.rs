// # Fetcher Trait
//
// Defines how the checker retrieves a page body.
//
// ## Implementations
//
// - HTTP: `webwatch-http` crate (reqwest)
// - Tests: scripted fetchers returning canned bodies or errors
//
// ## Contract
//
// A fetcher sends one GET and returns the full body. Only transport-level
// failures are errors: a 404 or 500 page is a body like any other and is
// fingerprinted normally.

use async_trait::async_trait;
use std::fmt;

use crate::config::SiteRecord;

/// HTTP Basic credentials
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

// Keep passwords out of logs.
impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A single GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Target URL, used as-is
    pub url: String,
    /// Credentials to attach, if any
    pub credentials: Option<BasicAuth>,
}

impl FetchRequest {
    /// Create an unauthenticated request
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            credentials: None,
        }
    }

    /// Build the request for a site record
    ///
    /// Credentials are attached only when the record has both a username
    /// and a password (see [`SiteRecord::credentials`]).
    pub fn for_site(site: &SiteRecord) -> Self {
        Self {
            url: site.url.clone(),
            credentials: site.credentials().map(|(username, password)| BasicAuth {
                username: username.to_string(),
                password: password.to_string(),
            }),
        }
    }
}

/// Trait for page fetchers
///
/// # Thread Safety
///
/// One fetcher is shared by every concurrent check in a cycle, so
/// implementations must be `Send + Sync`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the body for `request`
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<u8>)`: The complete response body, whatever the status code
    /// - `Err(Error)`: Transport failure (DNS, connect, timeout, body read)
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<u8>, crate::Error>;
}
