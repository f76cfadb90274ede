// # Site Store Trait
//
// Defines the persistence interface for the site list.
//
// ## Lifecycle
//
// The site list is loaded exactly once before a cycle and saved exactly
// once after it. Neither call happens while checks are running.
//
// ## Implementations
//
// - File-based: TOML or JSON, atomic rewrite with backup
// - Memory: tests and embedding

use async_trait::async_trait;

use crate::config::SiteRecord;

/// Trait for site list persistence
///
/// Errors from either method are fatal to the run: a cycle never starts
/// without a loaded list, and a failed save is reported to the caller.
#[async_trait]
pub trait SiteStore: Send + Sync {
    /// Load the site list in its stored order
    async fn load(&self) -> Result<Vec<SiteRecord>, crate::Error>;

    /// Replace the stored site list with `records`
    async fn save(&self, records: &[SiteRecord]) -> Result<(), crate::Error>;
}
