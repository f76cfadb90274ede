// # webwatch-core
//
// Core library for webwatch: fetch a list of pages, fingerprint each one,
// and report the ones whose content changed since the last recorded change.
//
// ## Architecture Overview
//
// - **Fetcher**: Trait for retrieving a page body
// - **Notifier**: Trait for surfacing changes and errors to the user
// - **SiteStore**: Trait for loading and saving the site list
// - **RecordStore**: Lock-protected site list shared by concurrent checks
// - **SiteChecker**: Fetch → fingerprint → compare → update for one site
// - **WatchEngine**: Runs one checker per site and joins them all
//
// ## Design Principles
//
// 1. **One run, one cycle**: load once, check every site once, save once
// 2. **Contained failures**: a site that cannot be fetched affects only itself
// 3. **No torn state**: every read and write of the site list is serialized
// 4. **Library-First**: the binary only wires collaborators together

pub mod checker;
pub mod config;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod notify;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use checker::{CheckOutcome, CheckPhase, SiteChecker};
pub use config::{CheckConfig, SiteRecord, default_sites};
pub use engine::{CycleReport, WatchEngine};
pub use error::{Error, Result};
pub use fingerprint::{Fingerprint, HashAlgorithm, fingerprint};
pub use notify::{CommandNotifier, CommandTemplate, LogNotifier, NotifierChain};
pub use state::{FileSiteStore, MemorySiteStore, RecordStore};
pub use traits::{BasicAuth, FetchRequest, Fetcher, Notifier, SiteStore, WatchEvent};
