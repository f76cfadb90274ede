//! Content fingerprints
//!
//! A fingerprint is the `(byte length, digest)` pair used to notice that a
//! page changed without keeping the page itself.
//!
//! ## Compatibility
//!
//! SHA-1 is the default because site lists written by earlier versions
//! store SHA-1 hashes. Switching to SHA-256 is supported, but every site
//! reports a change once on the first cycle after the switch.

use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Digest used for the hash half of a fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-1 (hex, 40 chars)
    #[default]
    Sha1,
    /// SHA-256 (hex, 64 chars)
    Sha256,
}

impl HashAlgorithm {
    /// Lowercase name, as accepted by [`FromStr`]
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(HashAlgorithm::Sha1),
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            other => Err(crate::Error::config(format!(
                "Unsupported hash algorithm '{}'. Supported: sha1, sha256",
                other
            ))),
        }
    }
}

/// Size and hex digest of a response body
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    /// Exact byte length of the body
    pub size: u64,
    /// Lowercase hex digest of the body
    pub hash: String,
}

impl Fingerprint {
    /// Create a fingerprint from already-known parts
    pub fn new(size: u64, hash: impl Into<String>) -> Self {
        Self {
            size,
            hash: hash.into(),
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.size, self.hash)
    }
}

/// Compute the fingerprint of `body`
///
/// Pure and deterministic: the same bytes always give the same result.
pub fn fingerprint(body: &[u8], algorithm: HashAlgorithm) -> Fingerprint {
    let hash = match algorithm {
        HashAlgorithm::Sha1 => hex::encode(Sha1::digest(body)),
        HashAlgorithm::Sha256 => hex::encode(Sha256::digest(body)),
    };

    Fingerprint {
        size: body.len() as u64,
        hash,
    }
}
