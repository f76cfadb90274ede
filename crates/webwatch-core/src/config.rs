//! Configuration types for webwatch
//!
//! The site list is both configuration and state: each [`SiteRecord`] names
//! a page to watch and remembers the fingerprint of the last change seen.
//! Field names on disk match the site list format used by earlier versions
//! (`Description`, `URL`, `LastBytes`, ...), so existing files load as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::fingerprint::{Fingerprint, HashAlgorithm};

/// One monitored page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRecord {
    /// Human-readable label (display only, not unique)
    #[serde(rename = "Description")]
    pub description: String,

    /// Fetch target, used as-is for the request
    #[serde(rename = "URL")]
    pub url: String,

    /// HTTP Basic username (empty = none)
    #[serde(rename = "Username", default)]
    pub username: String,

    /// HTTP Basic password (empty = none)
    #[serde(rename = "Password", default)]
    pub password: String,

    /// When the last change was recorded
    ///
    /// Not touched by checks that find no change.
    #[serde(rename = "LastCheck", default = "epoch")]
    pub last_check: DateTime<Utc>,

    /// Body size at the last recorded change
    #[serde(rename = "LastBytes", default)]
    pub last_size: u64,

    /// Hex digest of the body at the last recorded change
    #[serde(rename = "LastHash", default)]
    pub last_hash: String,
}

impl SiteRecord {
    /// Create a record that has never been checked
    pub fn new(description: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            url: url.into(),
            username: String::new(),
            password: String::new(),
            last_check: epoch(),
            last_size: 0,
            last_hash: String::new(),
        }
    }

    /// Set HTTP Basic credentials
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Set the stored fingerprint
    pub fn with_last_fingerprint(mut self, fingerprint: &Fingerprint) -> Self {
        self.last_size = fingerprint.size;
        self.last_hash = fingerprint.hash.clone();
        self
    }

    /// Basic credentials to send, if any
    ///
    /// Credentials are only used when *both* username and password are
    /// non-empty. A record with just one of them set is fetched without
    /// authentication.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if !self.username.is_empty() && !self.password.is_empty() {
            Some((&self.username, &self.password))
        } else {
            None
        }
    }

    /// Whether exactly one of username/password is set
    pub fn has_partial_credentials(&self) -> bool {
        self.username.is_empty() != self.password.is_empty()
    }

    /// The fingerprint stored for the last recorded change
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::new(self.last_size, self.last_hash.clone())
    }

    /// Copy of this record after a change was detected at `at`
    ///
    /// Only `last_size`, `last_hash` and `last_check` differ from `self`.
    pub fn with_fingerprint(&self, fingerprint: &Fingerprint, at: DateTime<Utc>) -> Self {
        Self {
            last_check: at,
            last_size: fingerprint.size,
            last_hash: fingerprint.hash.clone(),
            ..self.clone()
        }
    }
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

/// Placeholder site list written on first run
pub fn default_sites() -> Vec<SiteRecord> {
    ["First", "Second", "Third"]
        .into_iter()
        .map(|name| {
            SiteRecord::new(name, "http://localhost").with_credentials("user", "password")
        })
        .collect()
}

/// Check cycle settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Time limit for a single site's fetch (None = client default)
    #[serde(default)]
    pub check_timeout_secs: Option<u64>,

    /// Time limit for the whole cycle (None = wait for every site)
    ///
    /// When it expires, unfinished checks are cancelled and reported as
    /// failed; the cycle still waits for every check to stop before it
    /// returns.
    #[serde(default)]
    pub cycle_deadline_secs: Option<u64>,

    /// Digest used for fingerprints
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,
}

impl CheckConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.check_timeout_secs == Some(0) {
            return Err(crate::Error::config("Check timeout must be > 0"));
        }
        if self.cycle_deadline_secs == Some(0) {
            return Err(crate::Error::config("Cycle deadline must be > 0"));
        }
        Ok(())
    }

    /// Per-check timeout as a duration
    pub fn check_timeout(&self) -> Option<Duration> {
        self.check_timeout_secs.map(Duration::from_secs)
    }

    /// Cycle deadline as a duration
    pub fn cycle_deadline(&self) -> Option<Duration> {
        self.cycle_deadline_secs.map(Duration::from_secs)
    }
}
