//! Collaborator traits for webwatch
//!
//! The check cycle talks to the outside world only through these interfaces.
//!
//! - [`Fetcher`]: Retrieve a page body
//! - [`Notifier`]: Surface changes and errors to the user
//! - [`SiteStore`]: Load and save the site list

pub mod fetcher;
pub mod notifier;
pub mod site_store;

pub use fetcher::{BasicAuth, FetchRequest, Fetcher};
pub use notifier::{Notifier, WatchEvent};
pub use site_store::SiteStore;
